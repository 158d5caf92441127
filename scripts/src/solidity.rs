//! Definitions of the Solidity interfaces called during deployment & bootstrap

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use alloy_sol_types::sol;

sol! {
    /// The program token contract
    interface IProgram {
        function setDevContractAddr(address devContract) external;
        function setSupportAbility(string memory ability, bool supported) external;
        function setAbilityInitNumber(string memory ability, uint256 initNumber) external;
        function getUserTokenNumber(address owner) external view returns (uint256 count);
        function getUserTokenIds(address owner, uint256 offset, uint256 count) external view returns (uint256[] memory ids);
        function setApprovalForAll(address operator, bool approved) external;
    }

    /// The developer registry contract
    interface IDeveloper {
        function registerDev(string memory name, string memory bio, address referrer, uint256 flag, string memory imageUrl, string memory profileUrl) external;
        function registerProgram(string memory ability, uint256 level, uint256 variant, bytes memory codeHash, string memory description, string memory url) external;
    }

    /// The robot token contract
    interface IRobot {
        function setRobocup(address robocup) external;
        function getCurrentPriceToMint(uint256 count) external view returns (uint256 price);
        function getCurrentPriceToBurn(uint256 count) external view returns (uint256 price);
        function mint(uint256 count, uint256 amount) external payable;
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256 tokenId);
        function bindProgram2Robot(uint256 programId, uint256 robotId) external;
    }

    /// The competition platform contract
    interface IRobocupCompetitionPlatform {
        function setEmulatePlatform(address platform, bool enabled) external;
        function checkRobotContainProgram(uint256 robotId, uint256 abilityLevel) external view returns (bool contained);
        function addExpectRobotWithProgram(uint256 robotId, uint256 abilityLevel) external;
        function launchChallenge(uint256 robotIdA, uint256 levelA, uint256 robotIdB, uint256 levelB) external payable returns (uint256 competitionId);
        function tokenId2CompetitionMap(uint256 competitionId) external view returns (uint256 robotAId, uint256 robotALevel, uint256 robotBId, uint256 robotBLevel, uint256 stake, bool finished);
    }
}

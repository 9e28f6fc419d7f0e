// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Contract interfaces for the DeCriCo deployment.

use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IAidRequest {
        struct Request {
            uint256 id;
            address requester;
            string title;
            string description;
            uint8 category;
            string location;
            uint256 targetAmount;
            uint256 raisedAmount;
            uint256 deadline;
            uint8 status;
            bool urgent;
            bool verified;
        }

        event RequestCreated(uint256 indexed requestId, address indexed requester, uint256 targetAmount);
        event RequestVerified(uint256 indexed requestId, address indexed verifier, bool approved);

        function createRequest(
            string title,
            string description,
            uint8 category,
            string location,
            uint256 targetAmount,
            uint256 deadline,
            bool urgent
        ) external returns (uint256);
        function verifyRequest(uint256 requestId, bool approve) external;
        function getRequest(uint256 requestId) external view returns (Request memory);
        function requestCount() external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IDonation {
        event DonationMade(
            uint256 indexed donationId,
            uint256 indexed requestId,
            address indexed donor,
            address recipient,
            uint256 amount
        );

        function donate(uint256 requestId, address recipient, string message, bool anonymous)
            external
            payable
            returns (uint256);
        function totalDonated(address donor) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IGovernance {
        struct Proposal {
            uint256 id;
            address proposer;
            string title;
            string description;
            uint8 category;
            uint256 votesFor;
            uint256 votesAgainst;
            uint256 deadline;
            uint8 status;
        }

        event ProposalCreated(uint256 indexed proposalId, address indexed proposer, uint256 deadline);
        event VoteCast(uint256 indexed proposalId, address indexed voter, bool support);

        function createProposal(string title, string description, uint8 category, uint256 votingPeriod)
            external
            returns (uint256);
        function vote(uint256 proposalId, bool support) external;
        function getProposal(uint256 proposalId) external view returns (Proposal memory);
        function proposalCount() external view returns (uint256);
    }
}

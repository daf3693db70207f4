use crate::types::{DlpInfo, RawPerformance};
use alloy::sol;

// DLP Registry ABI
sol! {
    #[sol(rpc)]
    interface IDlpRegistry {
        struct DlpInfo {
            uint256 id;
            address dlpAddress;
            address ownerAddress;
            address tokenAddress;
            address treasuryAddress;
            string name;
            string iconUrl;
            string website;
            string metadata;
            uint256 registrationBlockNumber;
            uint256 depositAmount;
            uint8 status;
            uint256 lpTokenId;
            uint256 verificationBlockNumber;
        }

        function dlpsCount() external view returns (uint256);
        function eligibleDlpsListValues() external view returns (uint256[] memory);
        function dlps(uint256 dlpId) external view returns (DlpInfo memory);
    }
}

// DLP Performance ABI
sol! {
    #[sol(rpc)]
    interface IDlpPerformance {
        struct EpochDlpPerformanceInfo {
            uint256 totalScore;
            uint256 tradingVolume;
            uint256 uniqueContributors;
            uint256 dataAccessFees;
            uint256 tradingVolumeScore;
            uint256 uniqueContributorsScore;
            uint256 dataAccessFeesScore;
            uint256 tradingVolumeScorePenalty;
            uint256 uniqueContributorsScorePenalty;
            uint256 dataAccessFeesScorePenalty;
        }

        function epochDlpPerformances(uint256 epochId, uint256 dlpId)
            external view returns (EpochDlpPerformanceInfo memory);

        event EpochDlpPerformancesSaved(
            uint256 indexed epochId,
            uint256 indexed dlpId,
            uint256 tradingVolume,
            uint256 uniqueContributors,
            uint256 dataAccessFees,
            uint256 tradingVolumeScore,
            uint256 uniqueContributorsScore,
            uint256 dataAccessFeesScore
        );

        event EpochDlpPerformancesOverridden(
            uint256 indexed epochId,
            uint256 indexed dlpId,
            uint256 tradingVolume,
            uint256 uniqueContributors,
            uint256 dataAccessFees,
            uint256 tradingVolumeScore,
            uint256 uniqueContributorsScore,
            uint256 dataAccessFeesScore
        );
    }
}

// Vana epoch ABI
sol! {
    #[sol(rpc)]
    interface IVanaEpoch {
        function epochsCount() external view returns (uint256);
    }
}

// Multicall3 ABI (aggregate3 only)
sol! {
    #[sol(rpc)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct CallResult {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls)
            external payable returns (CallResult[] memory returnData);
    }
}

impl From<IDlpRegistry::DlpInfo> for DlpInfo {
    fn from(info: IDlpRegistry::DlpInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            icon_url: info.iconUrl,
            website: info.website,
            metadata: info.metadata,
            address: info.dlpAddress,
            status: info.status,
        }
    }
}

impl From<IDlpPerformance::EpochDlpPerformanceInfo> for RawPerformance {
    fn from(info: IDlpPerformance::EpochDlpPerformanceInfo) -> Self {
        Self {
            total_score: Some(info.totalScore),
            trading_volume: info.tradingVolume,
            unique_contributors: info.uniqueContributors,
            data_access_fees: info.dataAccessFees,
            trading_volume_score: info.tradingVolumeScore,
            unique_contributors_score: info.uniqueContributorsScore,
            data_access_fees_score: info.dataAccessFeesScore,
            trading_volume_score_penalty: info.tradingVolumeScorePenalty,
            unique_contributors_score_penalty: info.uniqueContributorsScorePenalty,
            data_access_fees_score_penalty: info.dataAccessFeesScorePenalty,
        }
    }
}

impl From<IDlpPerformance::EpochDlpPerformancesSaved> for RawPerformance {
    fn from(event: IDlpPerformance::EpochDlpPerformancesSaved) -> Self {
        Self {
            total_score: None,
            trading_volume: event.tradingVolume,
            unique_contributors: event.uniqueContributors,
            data_access_fees: event.dataAccessFees,
            trading_volume_score: event.tradingVolumeScore,
            unique_contributors_score: event.uniqueContributorsScore,
            data_access_fees_score: event.dataAccessFeesScore,
            ..Default::default()
        }
    }
}

impl From<IDlpPerformance::EpochDlpPerformancesOverridden> for RawPerformance {
    fn from(event: IDlpPerformance::EpochDlpPerformancesOverridden) -> Self {
        Self {
            total_score: None,
            trading_volume: event.tradingVolume,
            unique_contributors: event.uniqueContributors,
            data_access_fees: event.dataAccessFees,
            trading_volume_score: event.tradingVolumeScore,
            unique_contributors_score: event.uniqueContributorsScore,
            data_access_fees_score: event.dataAccessFeesScore,
            ..Default::default()
        }
    }
}

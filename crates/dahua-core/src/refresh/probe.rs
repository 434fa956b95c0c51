// ── Capability probe ──
//
// One best-effort call whose failure mode says whether the device has the
// feature. Transport-level failures mean "unsupported"; anything else is a
// real error and fails the tick.

use tracing::debug;

use dahua_api::KeyValues;

use crate::api::{ApiOperation, DeviceApi};

/// Result of a probe that did not hit a hard error.
#[derive(Debug)]
pub(crate) enum ProbeOutcome {
    /// The call succeeded; the response is reusable for this tick.
    Supported(KeyValues),
    Unsupported,
}

pub(crate) async fn probe<A: DeviceApi>(
    api: &A,
    op: ApiOperation,
) -> Result<ProbeOutcome, dahua_api::Error> {
    match api.fetch(op.clone()).await {
        Ok(values) => Ok(ProbeOutcome::Supported(values)),
        Err(e) if e.is_client_error() => {
            debug!(?op, error = %e, "probe failed, capability unsupported");
            Ok(ProbeOutcome::Unsupported)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, Reply, kv};

    #[tokio::test]
    async fn classifies_outcomes() {
        let api = FakeApi::default();
        api.reply(ApiOperation::LightingV2, Reply::Ok(kv(&[("a", "1")])));
        api.reply(ApiOperation::DisarmingLinkage, Reply::Status(400));
        api.reply(ApiOperation::CoaxialControlStatus, Reply::Malformed);

        assert!(matches!(
            probe(&api, ApiOperation::LightingV2).await.unwrap(),
            ProbeOutcome::Supported(v) if v.len() == 1
        ));
        assert!(matches!(
            probe(&api, ApiOperation::DisarmingLinkage).await.unwrap(),
            ProbeOutcome::Unsupported
        ));
        assert!(probe(&api, ApiOperation::CoaxialControlStatus).await.is_err());
    }
}

// Test doubles shared by the unit tests.
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use dahua_api::{Error, KeyValues};

use crate::api::{ApiOperation, DeviceApi};
use crate::clock::Clock;

pub(crate) struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Scripted answer for one operation.
#[derive(Clone)]
pub(crate) enum Reply {
    Ok(KeyValues),
    Status(u16),
    Malformed,
}

/// `DeviceApi` fake: answers from a script and records every call.
///
/// Operations without a script answer HTTP 400, like older firmwares do
/// for unknown CGI actions.
#[derive(Default)]
pub(crate) struct FakeApi {
    replies: Mutex<HashMap<ApiOperation, Reply>>,
    calls: Mutex<Vec<ApiOperation>>,
}

pub(crate) fn kv(pairs: &[(&str, &str)]) -> KeyValues {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

impl FakeApi {
    /// A device that answers the identity calls and the common config for
    /// profile 0.
    pub(crate) fn device(model: &str) -> Self {
        let api = Self::default();
        api.reply(
            ApiOperation::SystemInfo,
            Reply::Ok(kv(&[("deviceType", model), ("serialNumber", "SN123")])),
        );
        api.reply(
            ApiOperation::MachineName,
            Reply::Ok(kv(&[("table.General.MachineName", "Cam1")])),
        );
        api.reply(
            ApiOperation::SoftwareVersion,
            Reply::Ok(kv(&[("version", "2.800.0000000.25.R")])),
        );
        api.reply(
            common("0"),
            Reply::Ok(kv(&[
                ("table.MotionDetect[0].Enable", "true"),
                ("table.Lighting[0][0].Mode", "Auto"),
            ])),
        );
        api.reply(ApiOperation::SetMotionDetection(false), Reply::Ok(KeyValues::new()));
        api.reply(ApiOperation::SetMotionDetection(true), Reply::Ok(KeyValues::new()));
        api
    }

    pub(crate) fn reply(&self, op: ApiOperation, reply: Reply) {
        self.replies.lock().unwrap().insert(op, reply);
    }

    pub(crate) fn calls(&self, op: &ApiOperation) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == op).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub(crate) fn common(profile: &str) -> ApiOperation {
    ApiOperation::CommonConfig {
        profile: profile.to_owned(),
    }
}

pub(crate) fn profile_probe() -> ApiOperation {
    ApiOperation::Config {
        name: "Lighting[0][2]".to_owned(),
    }
}

impl DeviceApi for FakeApi {
    async fn fetch(&self, op: ApiOperation) -> Result<KeyValues, Error> {
        self.calls.lock().unwrap().push(op.clone());
        let reply = self.replies.lock().unwrap().get(&op).cloned();
        match reply {
            Some(Reply::Ok(values)) => Ok(values),
            Some(Reply::Status(status)) => Err(Error::Status {
                status,
                body: String::new(),
            }),
            Some(Reply::Malformed) => Err(Error::Deserialization {
                message: "garbled".into(),
                body: String::new(),
            }),
            None => Err(Error::Status {
                status: 400,
                body: "Bad Request!".into(),
            }),
        }
    }
}

use super::test_helpers::*;
use super::*;
use crate::error::{Error, TransferError};
use crate::ledger::{FileLedger, Ledger};
use crate::types::{AssetKind, ItemId, ItemStatus, TaskId};
use wiremock::MockServer;

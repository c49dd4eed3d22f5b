use jsonrpsee::core::client::Error as ClientError;

use crate::GatewayError;

/// Maps a revert reason reported by the rollup onto the gateway taxonomy.
pub(crate) fn classify_revert(reason: &str) -> GatewayError {
    let lower = reason.to_ascii_lowercase();
    if lower.contains("nullifier") || lower.contains("already consumed") {
        GatewayError::ClaimAlreadyConsumed
    } else if lower.contains("message not in state") || lower.contains("no l1 to l2 message") {
        GatewayError::MessageNotYetAvailable
    } else if lower.contains("unauthorized") || lower.contains("authwit") {
        GatewayError::AuthorizationMissing
    } else {
        GatewayError::TransactionRejected(reason.to_owned())
    }
}

/// Maps a JSON-RPC client failure. Node-side call errors carry revert reasons.
pub(crate) fn rpc_err(what: &str, err: ClientError) -> GatewayError {
    match err {
        ClientError::Call(obj) => classify_revert(obj.message()),
        ClientError::ParseError(e) => GatewayError::invalid_response(format!("{what}: {e}")),
        other => GatewayError::rpc(format!("{what}: {other}")),
    }
}

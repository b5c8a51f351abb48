//! JavaScript execution operations for CDP page session.

use serde_json::{Value, json};

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{ExceptionDetails, RemoteObject};

use super::core::PageSession;

/// The error carried by a `Runtime.*` result, if the script threw.
pub(super) fn script_exception(result: &Value) -> Option<CdpError> {
    let details = result.get("exceptionDetails")?;
    let message = serde_json::from_value::<ExceptionDetails>(details.clone())
        .map(|d| d.message())
        .unwrap_or_else(|_| {
            details["text"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string()
        });
    Some(CdpError::JavaScript(message))
}

/// `Runtime.callFunctionOn` arguments: every value is passed as a `CallArgument`.
pub(super) fn call_arguments(args: Vec<Value>) -> Value {
    Value::Array(args.into_iter().map(|v| json!({ "value": v })).collect())
}

impl PageSession {
    /// Evaluate JavaScript expression.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(e) = script_exception(&result) {
            return Err(e);
        }

        Ok(result["result"]["value"].clone())
    }

    /// Evaluate JavaScript and return remote object.
    pub async fn evaluate_handle(&self, expression: &str) -> Result<RemoteObject, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": false,
                })),
            )
            .await?;

        if let Some(e) = script_exception(&result) {
            return Err(e);
        }

        let remote_obj: RemoteObject = serde_json::from_value(result["result"].clone())?;
        Ok(remote_obj)
    }

    /// Call `function` with the remote object as `this`.
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, CdpError> {
        let params = json!({
            "objectId": object_id,
            "functionDeclaration": function,
            "arguments": call_arguments(args),
            "returnByValue": true,
            "awaitPromise": true,
        });

        let result = self.call("Runtime.callFunctionOn", Some(params)).await?;

        if let Some(e) = script_exception(&result) {
            return Err(e);
        }

        Ok(result["result"]["value"].clone())
    }

    /// Call `function` with the page's `document` as `this`.
    ///
    /// The document handle is resolved per call, so the call keeps working
    /// after the page navigates.
    pub async fn call_document_function(
        &self,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, CdpError> {
        let document = self.evaluate_handle("document").await?;
        let object_id = document
            .object_id
            .ok_or_else(|| CdpError::InvalidResponse("document has no objectId".to_string()))?;

        let result = self.call_function_on(&object_id, function, args).await;

        let _ = self
            .call("Runtime.releaseObject", Some(json!({"objectId": object_id})))
            .await;
        result
    }
}

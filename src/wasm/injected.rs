//! InjectedWallet - `window.ethereum` behind the WalletProvider trait.

use async_trait::async_trait;
use futures::channel::mpsc;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::log;
use crate::core::methods::rpc;
use crate::error::ProviderError;
use crate::wallet::{HostEnvironment, WalletHandle, WalletProvider};

type Watchers = Rc<RefCell<Vec<mpsc::UnboundedSender<Vec<String>>>>>;

pub struct InjectedWallet {
    provider: JsValue,
    watchers: Watchers,
    accounts_hook: RefCell<Option<Closure<dyn FnMut(JsValue)>>>,
}

impl InjectedWallet {
    fn new(provider: JsValue) -> Self {
        Self { provider, watchers: Rc::default(), accounts_hook: RefCell::new(None) }
    }

    fn function(&self, name: &str) -> Result<js_sys::Function, ProviderError> {
        get_prop(&self.provider, name)
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| ProviderError::new(ProviderError::DISCONNECTED, format!("window.ethereum.{name} is unavailable")))
    }

    /// Register the `accountsChanged` listener once; it fans out to every subscriber.
    fn ensure_accounts_hook(&self) -> Result<(), ProviderError> {
        if self.accounts_hook.borrow().is_some() {
            return Ok(());
        }
        let on = self.function("on").or_else(|_| self.function("addListener"))?;
        let watchers = Rc::clone(&self.watchers);
        let hook = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let accounts: Vec<String> = if js_sys::Array::is_array(&value) {
                js_sys::Array::from(&value).iter().filter_map(|v| v.as_string()).collect()
            } else {
                Vec::new()
            };
            watchers.borrow_mut().retain(|tx| tx.unbounded_send(accounts.clone()).is_ok());
        });
        on.call2(&self.provider, &JsValue::from_str(rpc::ACCOUNTS_CHANGED), hook.as_ref().unchecked_ref())
            .map_err(|e| ProviderError::malformed(format!("register {} failed: {e:?}", rpc::ACCOUNTS_CHANGED)))?;
        *self.accounts_hook.borrow_mut() = Some(hook);
        Ok(())
    }
}

#[async_trait(?Send)]
impl WalletProvider for InjectedWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let request_fn = self.function("request")?;
        let request = serde_json::json!({"method": method, "params": params});
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let request_js = serde::Serialize::serialize(&request, &serializer)
            .map_err(|e| ProviderError::malformed(format!("encode request: {e}")))?;
        let promise = request_fn
            .call1(&self.provider, &request_js)
            .map_err(js_error)?
            .dyn_into::<js_sys::Promise>()
            .map_err(|_| ProviderError::malformed("provider request did not return a Promise"))?;
        let result = JsFuture::from(promise).await.map_err(js_error)?;
        if result.is_null() || result.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| ProviderError::malformed(format!("decode response: {e}")))
    }

    fn subscribe_accounts(&self) -> mpsc::UnboundedReceiver<Vec<String>> {
        let (tx, rx) = mpsc::unbounded();
        match self.ensure_accounts_hook() {
            Ok(()) => self.watchers.borrow_mut().push(tx),
            Err(e) => log!("[charity] account notifications unavailable: {}", e),
        }
        rx
    }
}

/// The page's `window`, possibly carrying an injected `ethereum` object.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHost;

impl HostEnvironment for BrowserHost {
    fn injected_wallet(&self) -> Option<WalletHandle> {
        let window = web_sys::window()?;
        let provider = get_prop(&window.into(), "ethereum").ok()?;
        if provider.is_null() || provider.is_undefined() {
            return None;
        }
        Some(Rc::new(InjectedWallet::new(provider)))
    }
}

fn get_prop(target: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
}

/// Wallet rejections are objects carrying `code` and `message`.
fn js_error(err: JsValue) -> ProviderError {
    let code = get_prop(&err, "code").ok().and_then(|v| v.as_f64()).map(|c| c as i64);
    let message = get_prop(&err, "message").ok().and_then(|v| v.as_string());
    match (code, message) {
        (Some(code), Some(message)) => ProviderError::new(code, message),
        (Some(code), None) => ProviderError::new(code, format!("{err:?}")),
        _ => ProviderError::malformed(format!("{err:?}")),
    }
}

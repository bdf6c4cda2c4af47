//! CharityApp: the session exposed to JavaScript.
//!
//! Every action resolves to the current view (also on failure; the failure
//! is carried in `notice`).

use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use super::injected::BrowserHost;
use super::log;
use crate::config::ClientConfig;
use crate::session::SessionController;
use crate::view::SessionView;

#[wasm_bindgen]
pub struct CharityApp {
    session: Rc<SessionController>,
    watching: Cell<bool>,
}

fn to_js(view: &SessionView) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    view.serialize(&serializer).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
impl CharityApp {
    /// Detect the wallet. `contract_address` overrides the bundled deployment.
    #[wasm_bindgen(constructor)]
    pub fn new(contract_address: Option<String>) -> Result<CharityApp, JsValue> {
        let mut config = ClientConfig::default();
        if let Some(address) = contract_address.filter(|a| !a.is_empty()) {
            config = config.with_contract_address(address);
        }
        let session = SessionController::new(config, &BrowserHost)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log!("[CharityApp] wallet detected: {}", session.wallet_detected());
        Ok(Self { session: Rc::new(session), watching: Cell::new(false) })
    }

    #[wasm_bindgen]
    pub fn view(&self) -> Result<JsValue, JsValue> { to_js(&self.session.view()) }

    #[wasm_bindgen]
    pub async fn connect(&self) -> Result<JsValue, JsValue> {
        if let Err(e) = self.session.connect().await {
            log!("[CharityApp] connect: {}", e);
        }
        if self.session.snapshot().account.is_some() && !self.watching.replace(true) {
            let session = Rc::clone(&self.session);
            wasm_bindgen_futures::spawn_local(async move { session.watch_accounts().await });
        }
        self.view()
    }

    #[wasm_bindgen(js_name = "setDonationAmount")]
    pub fn set_donation_amount(&self, value: String) { self.session.set_donation_amount(value); }

    #[wasm_bindgen(js_name = "setNewOwner")]
    pub fn set_new_owner(&self, value: String) { self.session.set_new_owner(value); }

    #[wasm_bindgen]
    pub async fn donate(&self) -> Result<JsValue, JsValue> {
        if let Err(e) = self.session.donate().await {
            log!("[CharityApp] donate: {}", e);
        }
        self.view()
    }

    #[wasm_bindgen]
    pub async fn withdraw(&self) -> Result<JsValue, JsValue> {
        if let Err(e) = self.session.withdraw().await {
            log!("[CharityApp] withdraw: {}", e);
        }
        self.view()
    }

    #[wasm_bindgen(js_name = "refundDonation")]
    pub async fn refund_donation(&self) -> Result<JsValue, JsValue> {
        if let Err(e) = self.session.refund_donation().await {
            log!("[CharityApp] refund: {}", e);
        }
        self.view()
    }

    #[wasm_bindgen(js_name = "changeOwner")]
    pub async fn change_owner(&self) -> Result<JsValue, JsValue> {
        if let Err(e) = self.session.change_owner().await {
            log!("[CharityApp] change owner: {}", e);
        }
        self.view()
    }

    /// Load any field that is still unknown.
    #[wasm_bindgen]
    pub async fn refresh(&self) -> Result<JsValue, JsValue> {
        if let Err(e) = self.session.refresh_if_stale().await {
            log!("[CharityApp] refresh: {}", e);
        }
        self.view()
    }
}

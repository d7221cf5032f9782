//! Browser geolocation as a [`LocationPort`].

use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use companion_core::ports::LocationPort;
use companion_types::{CompanionError, Result, turn::GeoPoint};

pub struct BrowserGeolocation;

#[async_trait(?Send)]
impl LocationPort for BrowserGeolocation {
    async fn current_location(&self) -> Result<GeoPoint> {
        let geolocation = web_sys::window()
            .ok_or_else(|| CompanionError::JsInterop("No window object".to_string()))?
            .navigator()
            .geolocation()
            .map_err(js_err)?;

        let position = JsFuture::from(position_to_promise(&geolocation))
            .await
            .map_err(js_err)?;

        let coords = Reflect::get(&position, &JsValue::from_str("coords")).map_err(js_err)?;
        Ok(GeoPoint {
            latitude: read_f64(&coords, "latitude")?,
            longitude: read_f64(&coords, "longitude")?,
        })
    }
}

/// Wrap the callback-based `getCurrentPosition` into a Promise.
fn position_to_promise(geolocation: &web_sys::Geolocation) -> Promise {
    Promise::new(&mut move |resolve: Function, reject: Function| {
        let reject_on_throw = reject.clone();
        let onsuccess = Closure::once(move |position: JsValue| {
            let _ = resolve.call1(&JsValue::NULL, &position);
        });
        let onerror = Closure::once(move |error: JsValue| {
            let _ = reject.call1(&JsValue::NULL, &error);
        });

        if let Err(e) = geolocation.get_current_position_with_error_callback(
            onsuccess.as_ref().unchecked_ref(),
            Some(onerror.as_ref().unchecked_ref()),
        ) {
            let _ = reject_on_throw.call1(&JsValue::NULL, &e);
        }
        onsuccess.forget();
        onerror.forget();
    })
}

fn read_f64(target: &JsValue, field: &str) -> Result<f64> {
    Reflect::get(target, &JsValue::from_str(field))
        .map_err(js_err)?
        .as_f64()
        .ok_or_else(|| CompanionError::JsInterop(format!("Position has no {}", field)))
}

fn js_err(e: JsValue) -> CompanionError {
    CompanionError::JsInterop(format!("{:?}", e))
}

/// stlvol Web - WASM binding for in-browser estimates
///
/// Exposes the estimator over a file already loaded into memory (for example
/// from a browser file input), returning the same JSON document as the CLI.

use stlvol_core::{estimate_bytes, to_json, EstimateOptions, MaterialSelection, StlError, Unit, VolumeResult};
use wasm_bindgen::prelude::*;

fn parse_options(material: &str, unit: &str) -> Result<EstimateOptions, StlError> {
    let unit: Unit = unit.parse()?;
    Ok(EstimateOptions::new(MaterialSelection::from_selector(material), unit))
}

fn js_error(err: StlError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Estimate from raw STL bytes, returning a JSON string.
///
/// Never throws: failures come back as `{"error": "..."}`.
#[wasm_bindgen]
pub fn estimate(bytes: &[u8], material: &str, unit: &str) -> String {
    let outcome = parse_options(material, unit).and_then(|options| estimate_bytes(bytes, &options));
    to_json(&outcome).to_string()
}

/// Structured estimate for callers that want the numbers directly
#[wasm_bindgen]
pub struct Estimate {
    result: VolumeResult,
}

#[wasm_bindgen]
impl Estimate {
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: &[u8], material: &str, unit: &str) -> Result<Estimate, JsValue> {
        let options = parse_options(material, unit).map_err(js_error)?;
        let result = estimate_bytes(bytes, &options).map_err(js_error)?;
        Ok(Estimate { result })
    }

    #[wasm_bindgen(getter)]
    pub fn material(&self) -> String {
        self.result.material.material.to_string()
    }

    /// Whether the requested material was unknown and ABS was used instead
    #[wasm_bindgen(getter, js_name = usedDefaultMaterial)]
    pub fn used_default_material(&self) -> bool {
        self.result.material.used_default
    }

    #[wasm_bindgen(getter)]
    pub fn triangles(&self) -> i32 {
        self.result.triangle_count
    }

    #[wasm_bindgen(getter, js_name = facetsRead)]
    pub fn facets_read(&self) -> u32 {
        u32::try_from(self.result.facets_read).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(getter, js_name = volumeCm3)]
    pub fn volume_cm3(&self) -> f64 {
        self.result.volume_cm3
    }

    /// Volume in the requested unit
    #[wasm_bindgen(getter)]
    pub fn volume(&self) -> f64 {
        self.result.display_volume()
    }

    #[wasm_bindgen(getter, js_name = massGrams)]
    pub fn mass_grams(&self) -> f64 {
        self.result.mass_grams
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> String {
        to_json(&Ok(self.result.clone())).to_string()
    }
}

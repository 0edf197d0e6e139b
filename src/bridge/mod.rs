//! JSON request/response bridge
//!
//! Each request names a channel (`raw-materials:getAll`, ...) and carries its
//! arguments as camelCase fields next to it. Every request produces exactly
//! one response envelope:
//!
//! ```json
//! {"ok": true, "data": ...}
//! {"ok": false, "error": {"kind": "NotFound", "message": "..."}}
//! ```

use std::io::{self, BufRead, Write};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{InventoryError, InventoryStore, Result};
use crate::entities::{
    MasterDraft, MasterPatch, NewPackingMaterial, NewRawMaterial, PackingMaterialPatch,
    RawMaterialPatch, RecordKind,
};

/// A bridge request, tagged by channel name
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "channel")]
pub enum Request {
    #[serde(rename = "raw-materials:getAll")]
    RawGetAll,
    #[serde(rename = "raw-materials:getById")]
    RawGetById { id: i64 },
    #[serde(rename = "raw-materials:create")]
    RawCreate { material: NewRawMaterial },
    #[serde(rename = "raw-materials:update")]
    RawUpdate { id: i64, material: RawMaterialPatch },
    #[serde(rename = "raw-materials:delete")]
    RawDelete { id: i64 },
    #[serde(rename = "raw-materials:generateTestNumber")]
    RawGenerateTestNumber {
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    #[serde(rename = "raw-materials:checkTestNumberExists", rename_all = "camelCase")]
    RawCheckTestNumberExists {
        test_number: String,
        #[serde(default)]
        exclude_id: Option<i64>,
    },
    #[serde(rename = "raw-materials:findLatestByName")]
    RawFindLatestByName { name: String },

    #[serde(rename = "packing-materials:getAll")]
    PackingGetAll,
    #[serde(rename = "packing-materials:getById")]
    PackingGetById { id: i64 },
    #[serde(rename = "packing-materials:create")]
    PackingCreate { material: NewPackingMaterial },
    #[serde(rename = "packing-materials:update")]
    PackingUpdate { id: i64, material: PackingMaterialPatch },
    #[serde(rename = "packing-materials:delete")]
    PackingDelete { id: i64 },
    #[serde(rename = "packing-materials:generateTestNumber")]
    PackingGenerateTestNumber {
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    #[serde(rename = "packing-materials:checkTestNumberExists", rename_all = "camelCase")]
    PackingCheckTestNumberExists {
        test_number: String,
        #[serde(default)]
        exclude_id: Option<i64>,
    },

    #[serde(rename = "raw-material-masters:getAll")]
    MasterGetAll,
    #[serde(rename = "raw-material-masters:getById")]
    MasterGetById { id: i64 },
    #[serde(rename = "raw-material-masters:getByName")]
    MasterGetByName { name: String },
    #[serde(rename = "raw-material-masters:search")]
    MasterSearch { query: String },
    #[serde(rename = "raw-material-masters:create")]
    MasterCreate { master: MasterDraft },
    #[serde(rename = "raw-material-masters:update")]
    MasterUpdate { id: i64, master: MasterPatch },
    #[serde(rename = "raw-material-masters:delete")]
    MasterDelete { id: i64 },
    #[serde(rename = "raw-material-masters:convertToRawMaterial", rename_all = "camelCase")]
    MasterConvertToRawMaterial {
        master_id: i64,
        manufacturing_date: NaiveDate,
        receiving_quantity: f64,
        quantity: i64,
    },
}

impl Request {
    /// Channel name as sent on the wire
    pub fn channel(&self) -> &'static str {
        match self {
            Request::RawGetAll => "raw-materials:getAll",
            Request::RawGetById { .. } => "raw-materials:getById",
            Request::RawCreate { .. } => "raw-materials:create",
            Request::RawUpdate { .. } => "raw-materials:update",
            Request::RawDelete { .. } => "raw-materials:delete",
            Request::RawGenerateTestNumber { .. } => "raw-materials:generateTestNumber",
            Request::RawCheckTestNumberExists { .. } => "raw-materials:checkTestNumberExists",
            Request::RawFindLatestByName { .. } => "raw-materials:findLatestByName",
            Request::PackingGetAll => "packing-materials:getAll",
            Request::PackingGetById { .. } => "packing-materials:getById",
            Request::PackingCreate { .. } => "packing-materials:create",
            Request::PackingUpdate { .. } => "packing-materials:update",
            Request::PackingDelete { .. } => "packing-materials:delete",
            Request::PackingGenerateTestNumber { .. } => "packing-materials:generateTestNumber",
            Request::PackingCheckTestNumberExists { .. } => {
                "packing-materials:checkTestNumberExists"
            }
            Request::MasterGetAll => "raw-material-masters:getAll",
            Request::MasterGetById { .. } => "raw-material-masters:getById",
            Request::MasterGetByName { .. } => "raw-material-masters:getByName",
            Request::MasterSearch { .. } => "raw-material-masters:search",
            Request::MasterCreate { .. } => "raw-material-masters:create",
            Request::MasterUpdate { .. } => "raw-material-masters:update",
            Request::MasterDelete { .. } => "raw-material-masters:delete",
            Request::MasterConvertToRawMaterial { .. } => {
                "raw-material-masters:convertToRawMaterial"
            }
        }
    }
}

/// Error half of a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(kind: &str, message: impl Into<String>) -> Self {
        Response {
            ok: false,
            data: None,
            error: Some(ErrorBody {
                kind: kind.to_string(),
                message: message.into(),
            }),
        }
    }
}

impl From<InventoryError> for Response {
    fn from(err: InventoryError) -> Self {
        Response::failure(err.kind(), err.to_string())
    }
}

fn to_data<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| InventoryError::validation(format!("unserializable response: {}", e)))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Run one request against the store
pub fn dispatch(store: &mut InventoryStore, request: Request) -> Response {
    let channel = request.channel();
    debug!(channel, "bridge request");

    match execute(store, request) {
        Ok(data) => Response::success(data),
        Err(err) => {
            warn!(channel, kind = err.kind(), error = %err, "bridge request failed");
            err.into()
        }
    }
}

fn execute(store: &mut InventoryStore, request: Request) -> Result<Value> {
    match request {
        Request::RawGetAll => to_data(store.list_raw_materials()?),
        Request::RawGetById { id } => to_data(store.get_raw_material(id)?),
        Request::RawCreate { material } => {
            let draft = material.draft.normalized();
            to_data(store.create_raw_material(&material.test_number, &draft)?)
        }
        Request::RawUpdate { id, material } => {
            to_data(store.update_raw_material(id, &material.into_fields())?)
        }
        Request::RawDelete { id } => to_data(store.delete_raw_material(id)?),
        Request::RawGenerateTestNumber { date } => to_data(
            store.generate_test_number(RecordKind::RawMaterial, date.unwrap_or_else(today))?,
        ),
        Request::RawCheckTestNumberExists {
            test_number,
            exclude_id,
        } => to_data(store.test_number_exists(RecordKind::RawMaterial, &test_number, exclude_id)?),
        Request::RawFindLatestByName { name } => {
            to_data(store.find_latest_raw_material_by_name(&name)?)
        }

        Request::PackingGetAll => to_data(store.list_packing_materials()?),
        Request::PackingGetById { id } => to_data(store.get_packing_material(id)?),
        Request::PackingCreate { material } => {
            let draft = material.draft.normalized();
            to_data(store.create_packing_material(&material.test_number, &draft)?)
        }
        Request::PackingUpdate { id, material } => {
            to_data(store.update_packing_material(id, &material.into_fields())?)
        }
        Request::PackingDelete { id } => to_data(store.delete_packing_material(id)?),
        Request::PackingGenerateTestNumber { date } => to_data(
            store.generate_test_number(RecordKind::PackingMaterial, date.unwrap_or_else(today))?,
        ),
        Request::PackingCheckTestNumberExists {
            test_number,
            exclude_id,
        } => to_data(store.test_number_exists(
            RecordKind::PackingMaterial,
            &test_number,
            exclude_id,
        )?),

        Request::MasterGetAll => to_data(store.list_masters()?),
        Request::MasterGetById { id } => to_data(store.get_master(id)?),
        Request::MasterGetByName { name } => to_data(store.get_master_by_name(&name)?),
        Request::MasterSearch { query } => to_data(store.search_masters(&query)?),
        Request::MasterCreate { master } => to_data(store.create_master(&master.normalized())?),
        Request::MasterUpdate { id, master } => {
            to_data(store.update_master(id, &master.into_fields())?)
        }
        Request::MasterDelete { id } => to_data(store.delete_master(id)?),
        Request::MasterConvertToRawMaterial {
            master_id,
            manufacturing_date,
            receiving_quantity,
            quantity,
        } => to_data(store.expand_master(
            master_id,
            manufacturing_date,
            receiving_quantity,
            quantity,
        )?),
    }
}

/// Parse one JSON line and dispatch it
///
/// A line that is not a valid request yields a `ValidationFailure` response.
pub fn handle_line(store: &mut InventoryStore, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(store, request),
        Err(e) => {
            debug!(error = %e, "unparseable bridge request");
            InventoryError::validation(format!("malformed request: {}", e)).into()
        }
    }
}

/// Answer requests from `reader`, one per line, until end of input
///
/// Blank lines are skipped. Returns the number of requests handled.
pub fn serve<R: BufRead, W: Write>(
    store: &mut InventoryStore,
    reader: R,
    mut writer: W,
) -> io::Result<usize> {
    let mut handled = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(store, &line);
        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        handled += 1;
    }
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(store: &mut InventoryStore, request: Value) -> Response {
        handle_line(store, &request.to_string())
    }

    fn raw_material(test_number: &str, name: &str) -> Value {
        json!({
            "testNumber": test_number,
            "name": name,
            "receivingQuantity": 100.0,
            "netWeight": 25.0,
            "weightUnit": "kg",
            "quantity": 4,
            "manufacturingDate": "2025-05-20",
            "expireDate": "2026-05-20",
            "vendor": "Daehan Sugar",
            "country": "KR",
            "storageConditions": "Room Temperature",
            "foodType": "Sugar"
        })
    }

    fn master(name: &str, days: u32) -> Value {
        json!({
            "name": name,
            "shelfLifeDays": days,
            "netWeight": 20.0,
            "weightUnit": "kg",
            "vendor": "Barry",
            "country": "BE",
            "storageConditions": "Room Temperature",
            "memo": "dry storage"
        })
    }

    #[test]
    fn test_raw_material_round_trip() {
        let mut store = InventoryStore::open_in_memory().unwrap();

        let created = call(
            &mut store,
            json!({"channel": "raw-materials:create", "material": raw_material("AR25060101", "Sugar")}),
        );
        assert!(created.ok, "{:?}", created.error);
        let data = created.data.unwrap();
        assert_eq!(data["testNumber"], "AR25060101");
        assert_eq!(data["weightUnit"], "kg");
        assert!(data["created_at"].is_string());
        let id = data["id"].as_i64().unwrap();

        let all = call(&mut store, json!({"channel": "raw-materials:getAll"}));
        assert_eq!(all.data.unwrap().as_array().unwrap().len(), 1);

        let updated = call(
            &mut store,
            json!({"channel": "raw-materials:update", "id": id, "material": {"quantity": 9, "memo": "checked"}}),
        );
        let data = updated.data.unwrap();
        assert_eq!(data["quantity"], 9);
        assert_eq!(data["memo"], "checked");
        assert_eq!(data["name"], "Sugar");

        let deleted = call(&mut store, json!({"channel": "raw-materials:delete", "id": id}));
        assert_eq!(deleted.data, Some(json!(true)));

        let missing = call(&mut store, json!({"channel": "raw-materials:getById", "id": id}));
        assert!(missing.ok);
        assert_eq!(missing.data, Some(Value::Null));
    }

    #[test]
    fn test_generate_and_check_test_numbers() {
        let mut store = InventoryStore::open_in_memory().unwrap();
        call(
            &mut store,
            json!({"channel": "raw-materials:create", "material": raw_material("AR25060101", "Sugar")}),
        );

        let next = call(
            &mut store,
            json!({"channel": "raw-materials:generateTestNumber", "date": "2025-06-01"}),
        );
        assert_eq!(next.data, Some(json!("AR25060102")));

        let packing = call(
            &mut store,
            json!({"channel": "packing-materials:generateTestNumber", "date": "2025-06-01"}),
        );
        assert_eq!(packing.data, Some(json!("AP25060101")));

        let exists = call(
            &mut store,
            json!({"channel": "raw-materials:checkTestNumberExists", "testNumber": "AR25060101"}),
        );
        assert_eq!(exists.data, Some(json!(true)));

        let excluded = call(
            &mut store,
            json!({"channel": "raw-materials:checkTestNumberExists", "testNumber": "AR25060101", "excludeId": 1}),
        );
        assert_eq!(excluded.data, Some(json!(false)));
    }

    #[test]
    fn test_duplicate_test_number_is_reported() {
        let mut store = InventoryStore::open_in_memory().unwrap();
        let request = json!({"channel": "raw-materials:create", "material": raw_material("AR25060101", "Sugar")});
        assert!(call(&mut store, request.clone()).ok);

        let response = call(&mut store, request);
        assert!(!response.ok);
        assert_eq!(response.error.unwrap().kind, "DuplicateIdentifier");
    }

    #[test]
    fn test_packing_material_defaults_to_pass() {
        let mut store = InventoryStore::open_in_memory().unwrap();
        let response = call(
            &mut store,
            json!({"channel": "packing-materials:create", "material": {
                "testNumber": "AP25060101",
                "productName": "Choco Bar",
                "materialName": "Outer film",
                "receivingQuantity": 5000,
                "lotNumber": "L-2291",
                "expireDate": "2027-01-31",
                "category": "film",
                "vendor": "PackCo"
            }}),
        );
        assert!(response.ok, "{:?}", response.error);
        assert_eq!(response.data.unwrap()["result"], true);
    }

    #[test]
    fn test_master_search_and_convert() {
        let mut store = InventoryStore::open_in_memory().unwrap();
        let created = call(
            &mut store,
            json!({"channel": "raw-material-masters:create", "master": master("Milk powder", 730)}),
        );
        let master_id = created.data.unwrap()["id"].as_i64().unwrap();

        let found = call(
            &mut store,
            json!({"channel": "raw-material-masters:search", "query": "milk"}),
        );
        assert_eq!(found.data.unwrap().as_array().unwrap().len(), 1);

        let by_name = call(
            &mut store,
            json!({"channel": "raw-material-masters:getByName", "name": "Milk powder"}),
        );
        assert_eq!(by_name.data.unwrap()["id"], master_id);

        let draft = call(
            &mut store,
            json!({
                "channel": "raw-material-masters:convertToRawMaterial",
                "masterId": master_id,
                "manufacturingDate": "2025-01-01",
                "receivingQuantity": 40.0,
                "quantity": 2
            }),
        );
        let data = draft.data.unwrap();
        assert_eq!(data["expireDate"], "2027-01-01");
        assert_eq!(data["memo"], "dry storage");
        assert!(data.get("testNumber").is_none());

        let missing = call(
            &mut store,
            json!({
                "channel": "raw-material-masters:convertToRawMaterial",
                "masterId": master_id + 100,
                "manufacturingDate": "2025-01-01",
                "receivingQuantity": 0.0,
                "quantity": 0
            }),
        );
        assert_eq!(missing.error.unwrap().kind, "NotFound");
    }

    #[test]
    fn test_malformed_requests() {
        let mut store = InventoryStore::open_in_memory().unwrap();

        let response = handle_line(&mut store, "{not json");
        assert_eq!(response.error.unwrap().kind, "ValidationFailure");

        let response = call(&mut store, json!({"channel": "raw-materials:explode"}));
        assert_eq!(response.error.unwrap().kind, "ValidationFailure");

        let response = call(
            &mut store,
            json!({"channel": "raw-materials:create", "material": raw_material("AR2506", "Sugar")}),
        );
        assert_eq!(response.error.unwrap().kind, "ValidationFailure");
    }

    #[test]
    fn test_serve_answers_each_line() {
        let mut store = InventoryStore::open_in_memory().unwrap();
        let input = format!(
            "{}\n\n{}\n",
            json!({"channel": "raw-material-masters:getAll"}),
            json!({"channel": "raw-materials:getById", "id": 7})
        );
        let mut out = Vec::new();

        let handled = serve(&mut store, input.as_bytes(), &mut out).unwrap();
        assert_eq!(handled, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"ok":true,"data":[]}"#);
        assert_eq!(lines[1], r#"{"ok":true,"data":null}"#);
    }

    #[test]
    fn test_request_channel_names() {
        let request: Request = serde_json::from_value(
            json!({"channel": "packing-materials:checkTestNumberExists", "testNumber": "AP25060101"}),
        )
        .unwrap();
        assert_eq!(request.channel(), "packing-materials:checkTestNumberExists");
        assert_eq!(
            request,
            Request::PackingCheckTestNumberExists {
                test_number: "AP25060101".into(),
                exclude_id: None,
            }
        );
    }
}

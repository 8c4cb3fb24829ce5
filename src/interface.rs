//! JSON-shaped entry points.
//!
//! Each operation takes a small request record and always returns a
//! response record: `{"success": true, ...}` with the operation's fields,
//! or `{"success": false, "error": "..."}`. [`call`] dispatches by operation
//! name on raw JSON text.

use serde::{Deserialize, Serialize};

use crate::ast::Node;
use crate::code::decompile;
use crate::error::Error;
use crate::fragments::{Category, Fragment, FRAGMENTS};
use crate::smiles::{parse, to_smiles};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmilesRequest {
    pub smiles: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildRequest {
    pub ast: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Result<T, Error>> for Response<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(data) => Response {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Response {
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsed {
    pub ast: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Built {
    pub smiles: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decompiled {
    pub smiles: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundTrip {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regenerated: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragments {
    pub fragments: Vec<Fragment>,
    pub categories: Vec<Category>,
}

pub fn parse_smiles(req: &SmilesRequest) -> Response<Parsed> {
    parse(&req.smiles)
        .map(|ast| Parsed { ast })
        .map_err(Error::from)
        .into()
}

pub fn build_smiles(req: &BuildRequest) -> Response<Built> {
    to_smiles(&req.ast)
        .map(|smiles| Built { smiles })
        .map_err(Error::from)
        .into()
}

pub fn decompile_smiles(req: &SmilesRequest) -> Response<Decompiled> {
    fn run(smiles: &str) -> Result<Decompiled, Error> {
        let node = parse(smiles)?;
        Ok(Decompiled {
            smiles: smiles.to_string(),
            code: decompile(&node)?,
        })
    }
    run(&req.smiles).into()
}

pub fn validate_roundtrip(req: &SmilesRequest) -> Response<RoundTrip> {
    fn run(smiles: &str) -> Result<RoundTrip, Error> {
        let regenerated = to_smiles(&parse(smiles)?)?;
        let valid = regenerated == smiles;
        let message = if valid {
            format!("'{smiles}' round-trips exactly")
        } else {
            format!("round trip mismatch: '{smiles}' became '{regenerated}'")
        };
        Ok(RoundTrip {
            valid,
            regenerated: Some(regenerated),
            message,
        })
    }
    run(&req.smiles).into()
}

pub fn get_common_fragments() -> Response<Fragments> {
    Response {
        success: true,
        data: Some(Fragments {
            fragments: FRAGMENTS.to_vec(),
            categories: Category::ALL.to_vec(),
        }),
        error: None,
    }
}

/// Runs the operation `name` on the JSON request `input`, returning the
/// JSON response.
pub fn call(name: &str, input: &str) -> String {
    fn run<Req, T>(input: &str, op: impl FnOnce(&Req) -> Response<T>) -> String
    where
        Req: for<'de> Deserialize<'de>,
        T: Serialize,
    {
        match serde_json::from_str::<Req>(input) {
            Ok(req) => render(&op(&req)),
            Err(e) => failure(&format!("invalid request: {e}")),
        }
    }

    match name {
        "parse_smiles" => run(input, parse_smiles),
        "build_smiles" => run(input, build_smiles),
        "decompile_smiles" => run(input, decompile_smiles),
        "validate_roundtrip" => run(input, validate_roundtrip),
        "get_common_fragments" => render(&get_common_fragments()),
        other => failure(&format!("unknown operation '{other}'")),
    }
}

fn render<T: Serialize>(response: &Response<T>) -> String {
    serde_json::to_string(response)
        .unwrap_or_else(|e| failure(&format!("cannot encode response: {e}")))
}

fn failure(message: &str) -> String {
    serde_json::json!({ "success": false, "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn req(smiles: &str) -> SmilesRequest {
        SmilesRequest {
            smiles: smiles.to_string(),
        }
    }

    fn to_value<T: Serialize>(r: &Response<T>) -> Value {
        serde_json::to_value(r).unwrap()
    }

    #[test]
    fn parse_benzene_record() {
        let v = to_value(&parse_smiles(&req("c1ccccc1")));
        assert_eq!(
            v,
            json!({
                "success": true,
                "ast": {
                    "type": "ring",
                    "atoms": "c",
                    "size": 6,
                    "ringNumber": 1,
                    "offset": 0,
                    "substitutions": {},
                    "attachments": {},
                    "bonds": [null, null, null, null, null, null],
                }
            })
        );
    }

    #[test]
    fn parse_failure_record() {
        let v = to_value(&parse_smiles(&req("C1CC")));
        assert_eq!(v["success"], json!(false));
        assert!(v["error"].as_str().unwrap().contains("Unclosed"));
        assert!(v.get("ast").is_none());
    }

    #[test]
    fn build_from_record() {
        let ast = json!({
            "type": "linear",
            "atoms": ["C", "C", "O"],
            "bonds": [null, null],
            "attachments": {},
        });
        let request = BuildRequest {
            ast: serde_json::from_value(ast).unwrap(),
        };
        let v = to_value(&build_smiles(&request));
        assert_eq!(v, json!({ "success": true, "smiles": "CCO" }));
    }

    #[test]
    fn build_rejects_malformed_tree() {
        let out = call(
            "build_smiles",
            r#"{"ast": {"type": "linear", "atoms": ["C", "C"], "bonds": []}}"#,
        );
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["success"], json!(false));
    }

    #[test]
    fn decompile_record() {
        let v = to_value(&decompile_smiles(&req("CCO")));
        assert_eq!(
            v,
            json!({ "success": true, "smiles": "CCO", "code": "Linear(['C', 'C', 'O'])" })
        );
    }

    #[test]
    fn toluene_round_trip_record() {
        let v = to_value(&validate_roundtrip(&req("Cc1ccccc1")));
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["valid"], json!(true));
        assert_eq!(v["regenerated"], json!("Cc1ccccc1"));
    }

    #[test]
    fn fragments_record() {
        let v = to_value(&get_common_fragments());
        assert_eq!(v["categories"].as_array().unwrap().len(), 6);
        assert!(v["fragments"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f["name"] == "phenyl" && f["category"] == "aromatic"));
    }

    #[test]
    fn call_dispatch() {
        let out: Value = serde_json::from_str(&call("parse_smiles", r#"{"smiles": "CCO"}"#)).unwrap();
        assert_eq!(out["ast"]["type"], json!("linear"));
        let out: Value = serde_json::from_str(&call("nope", "{}")).unwrap();
        assert_eq!(out["success"], json!(false));
        let out: Value = serde_json::from_str(&call("parse_smiles", "{}")).unwrap();
        assert!(out["error"].as_str().unwrap().starts_with("invalid request"));
    }
}

// crates/shared/src/toolbelts/etl.rs

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::etl;
use crate::records::RecordSet;
use crate::register_toolbelt;

#[derive(Default)]
pub struct Etl;

register_toolbelt! {
    Etl {
        description: "Read, validate, clean and reshape tabular records",
        tools: {
            "read_csv_file" => read_csv_file {
                description: "Reads a CSV file from the given path and returns its contents as {\"data\": [...], \"columns\": [...]}.",
                params: [
                    "path": "string" => "Path to the CSV file",
                    "encoding": "string" => "File encoding, utf-8 (default) or latin-1" [optional]
                ]
            },
            "check_data_types" => check_data_types {
                description: "Casts each column named in type_mapping (e.g. {\"age\": \"int\", \"name\": \"str\"}) to int, float, str, bool or datetime. Ask the user for the mapping if it was not given.",
                params: [
                    "data": "array<object>" => "Records to check",
                    "type_mapping": "object" => "Column name to target type"
                ]
            },
            "detect_and_report_anomalies" => detect_and_report_anomalies {
                description: "Reports rows outside per-column numeric bounds, e.g. {\"age\": {\"min\": 0, \"max\": 120}}. Ask the user for the rules if they were not given.",
                params: [
                    "data": "array<object>" => "Records to analyze",
                    "anomaly_rules": "object" => "Column name to {min, max} bounds"
                ]
            },
            "remove_duplicates" => remove_duplicates {
                description: "Removes duplicate rows, keeping the first. Compares all columns unless subset_cols is given.",
                params: [
                    "data": "array<object>" => "Records to deduplicate",
                    "subset_cols": "array<string>" => "Columns to compare (default: all columns)" [optional]
                ]
            },
            "handle_missing_values" => handle_missing_values {
                description: "Handles missing values per column: \"drop\", \"ffill\", \"bfill\" or a literal fill value, e.g. {\"age\": \"drop\", \"salary\": 0}. Ask the user for the strategy if it was not given.",
                params: [
                    "data": "array<object>" => "Records to process",
                    "strategy": "object" => "Column name to strategy"
                ]
            },
            "standardize_values" => standardize_values {
                description: "Applies string rules per column, e.g. {\"name\": {\"lower\": true, \"strip\": true}, \"joined\": {\"date_format\": \"%Y-%m-%d\"}}.",
                params: [
                    "data": "array<object>" => "Records to standardize",
                    "rules": "object" => "Column name to {lower, strip, date_format}"
                ]
            },
            "enforce_constraints" => enforce_constraints {
                description: "Fails when a column breaks not_null or unique, e.g. {\"id\": {\"unique\": true}, \"age\": {\"not_null\": true}}.",
                params: [
                    "data": "array<object>" => "Records to check",
                    "constraints": "object" => "Column name to {not_null, unique}"
                ]
            },
            "transform_data" => transform_data {
                description: "Renames columns and derives new ones: {\"rename_columns\": {\"old\": \"new\"}, \"new_columns\": {\"total\": \"price * qty\"}}. Expressions allow numbers, column names, parentheses and + - * / %.",
                params: [
                    "data": "array<object>" => "Records to transform",
                    "transformation_rules": "object" => "rename_columns and/or new_columns"
                ]
            }
        }
    }
}

/// Reads a required argument. Models sometimes send structured arguments as
/// JSON text, so a string holding JSON is accepted too.
fn arg<T: DeserializeOwned>(args: &Value, name: &str) -> Result<T> {
    let value = match args.get(name) {
        None | Some(Value::Null) => anyhow::bail!("Missing required argument '{}'", name),
        Some(value) => value,
    };
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => Ok(parsed),
        Err(e) => match value.as_str().and_then(|text| serde_json::from_str::<Value>(text).ok()) {
            Some(decoded) => serde_json::from_value(decoded)
                .with_context(|| format!("Invalid argument '{}'", name)),
            None => Err(e).with_context(|| format!("Invalid argument '{}'", name)),
        },
    }
}

/// A structured argument, decoded from JSON text when sent as a string.
fn json_arg(args: &Value, name: &str) -> Result<Value> {
    match arg::<Value>(args, name)? {
        Value::String(text) => {
            serde_json::from_str(&text).with_context(|| format!("Invalid argument '{}'", name))
        }
        other => Ok(other),
    }
}

fn records(args: &Value) -> Result<RecordSet> {
    RecordSet::from_value(&json_arg(args, "data")?).context("Invalid argument 'data'")
}

fn data_response(data: &RecordSet) -> Result<String> {
    Ok(serde_json::to_string(&json!({ "data": data }))?)
}

impl Etl {
    fn read_csv_file(&self, args: &Value) -> Result<String> {
        let path: String = arg(args, "path")?;
        let encoding = args["encoding"].as_str().unwrap_or("utf-8");
        let table = etl::read_csv_file(&path, encoding)?;
        Ok(serde_json::to_string(&table)?)
    }

    fn check_data_types(&self, args: &Value) -> Result<String> {
        let data = records(args)?;
        let mapping: HashMap<String, String> = arg(args, "type_mapping")?;
        data_response(&etl::check_data_types(&data, &mapping)?)
    }

    fn detect_and_report_anomalies(&self, args: &Value) -> Result<String> {
        let data = records(args)?;
        let rules: BTreeMap<String, etl::RangeRule> = arg(args, "anomaly_rules")?;
        let report = etl::detect_and_report_anomalies(&data, &rules)?;
        Ok(serde_json::to_string(&report)?)
    }

    fn remove_duplicates(&self, args: &Value) -> Result<String> {
        let data = records(args)?;
        let subset: Option<Vec<String>> = match args.get("subset_cols") {
            None | Some(Value::Null) => None,
            Some(_) => Some(arg(args, "subset_cols")?),
        };
        let outcome = etl::remove_duplicates(&data, subset.as_deref())?;
        Ok(serde_json::to_string(&outcome)?)
    }

    fn handle_missing_values(&self, args: &Value) -> Result<String> {
        let data = records(args)?;
        let strategy: Map<String, Value> = arg(args, "strategy")?;
        data_response(&etl::handle_missing_values(&data, &strategy)?)
    }

    fn standardize_values(&self, args: &Value) -> Result<String> {
        let data = records(args)?;
        let rules: BTreeMap<String, etl::StandardizeRule> = arg(args, "rules")?;
        data_response(&etl::standardize_values(&data, &rules)?)
    }

    fn enforce_constraints(&self, args: &Value) -> Result<String> {
        let data = records(args)?;
        let constraints: BTreeMap<String, etl::ConstraintRule> = arg(args, "constraints")?;
        data_response(&etl::enforce_constraints(&data, &constraints)?)
    }

    fn transform_data(&self, args: &Value) -> Result<String> {
        let data = records(args)?;
        let rules = etl::TransformRules::from_value(&json_arg(args, "transformation_rules")?)?;
        data_response(&etl::transform_data(&data, &rules)?)
    }
}

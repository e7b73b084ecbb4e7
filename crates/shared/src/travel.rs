use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured request accepted by the travel planner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TravelInput {
    /// City or airport of departure.
    pub departure: String,
    pub destination: String,
    pub start_date: NaiveDate,
    /// Not checked against `start_date`.
    pub end_date: NaiveDate,
    pub num_travelers: u32,
    /// Interests such as "cultural", "pubs" or "parks".
    pub attractions: Vec<String>,
    /// Preferred accommodation type, e.g. hotel or apartment.
    pub accommodation_type: String,
}

impl TravelInput {
    pub fn from_value(value: &Value) -> Result<Self> {
        let input: TravelInput = serde_json::from_value(value.clone())
            .map_err(|e| anyhow::anyhow!("invalid travel input: {}", e))?;
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_travelers < 1 {
            bail!("num_travelers must be at least 1");
        }
        Ok(())
    }

    /// JSON schema advertised for the `input_data` argument.
    pub fn json_schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "departure": {"type": "string", "description": "City or airport of departure"},
                "destination": {"type": "string", "description": "Destination city"},
                "start_date": {"type": "string", "format": "date", "description": "Departure date"},
                "end_date": {"type": "string", "format": "date", "description": "Return date"},
                "num_travelers": {"type": "integer", "minimum": 1, "description": "Number of travelers"},
                "attractions": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Desired attractions like 'cultural', 'pubs', 'parks'"
                },
                "accommodation_type": {
                    "type": "string",
                    "description": "Preferred accommodation type (e.g., hotel, apartment)"
                }
            },
            "required": [
                "departure", "destination", "start_date", "end_date",
                "num_travelers", "attractions", "accommodation_type"
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "departure": "Lisbon",
            "destination": "Dublin",
            "start_date": "2025-06-10",
            "end_date": "2025-06-01",
            "num_travelers": 2,
            "attractions": ["pubs", "parks"],
            "accommodation_type": "apartment"
        })
    }

    #[test]
    fn end_before_start_is_accepted() {
        let input = TravelInput::from_value(&sample()).unwrap();
        assert!(input.end_date < input.start_date);
    }

    #[test]
    fn zero_travelers_is_rejected() {
        let mut value = sample();
        value["num_travelers"] = json!(0);
        assert!(TravelInput::from_value(&value).is_err());
    }

    #[test]
    fn missing_field_and_bad_date_are_rejected() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("destination");
        assert!(TravelInput::from_value(&value).is_err());

        let mut value = sample();
        value["start_date"] = json!("next tuesday");
        assert!(TravelInput::from_value(&value).is_err());
    }
}

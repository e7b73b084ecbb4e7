//! Travel planner form and the per-agent rendering of its crew output.

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use crossterm::style::Stylize;
use serde_json::{Value, json};
use switchboard_shared::{CrewOutput, TravelInput};

use crate::client::McpClient;
use crate::render;
use crate::ui::{call_with_indicator, connect, read_line};

pub const TRAVEL_TOOL: &str = "travel_planner";
pub const ATTRACTIONS: &[&str] = &["cultural", "local food", "parks", "pubs"];
pub const ACCOMMODATION_TYPES: &[&str] = &["hotel", "apartment", "hostel"];

/// Raw answers to the form prompts.
#[derive(Debug, Default, Clone)]
pub struct TravelForm {
    pub departure: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub num_travelers: String,
    pub attractions: String,
    pub accommodation_type: String,
}

impl TravelForm {
    /// Turns the answers into a planner request. Blank answers take the
    /// defaults: today, one traveler, cultural, hotel.
    pub fn to_input(&self, today: NaiveDate) -> Result<TravelInput> {
        let departure = self.departure.trim();
        let destination = self.destination.trim();
        if departure.is_empty() || destination.is_empty() {
            bail!("Please enter both departure and destination cities.");
        }

        let start_date = parse_date(&self.start_date, today)?;
        let end_date = parse_date(&self.end_date, start_date)?;

        let num_travelers = match self.num_travelers.trim() {
            "" => 1,
            n => n
                .parse::<u32>()
                .ok()
                .filter(|n| *n >= 1)
                .with_context(|| format!("'{}' is not a number of travelers", n))?,
        };

        let input = TravelInput {
            departure: departure.to_string(),
            destination: destination.to_string(),
            start_date,
            end_date,
            num_travelers,
            attractions: parse_attractions(&self.attractions)?,
            accommodation_type: pick_one(&self.accommodation_type, ACCOMMODATION_TYPES)?,
        };
        input.validate()?;
        Ok(input)
    }
}

fn parse_date(text: &str, default: NaiveDate) -> Result<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("'{}' is not a date (YYYY-MM-DD)", text))
}

fn parse_attractions(text: &str) -> Result<Vec<String>> {
    let chosen: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| pick_one(s, ATTRACTIONS))
        .collect::<Result<_>>()?;

    if chosen.is_empty() {
        return Ok(vec![ATTRACTIONS[0].to_string()]);
    }
    Ok(chosen)
}

fn pick_one(text: &str, options: &[&str]) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(options[0].to_string());
    }
    match options.iter().find(|o| o.eq_ignore_ascii_case(text)) {
        Some(option) => Ok(option.to_string()),
        None => bail!("'{}' is not one of: {}", text, options.join(", ")),
    }
}

pub fn payload(input: &TravelInput) -> Result<Value> {
    Ok(json!({"input_data": serde_json::to_value(input)?}))
}

/// One accommodation option pulled out of the stays agent's markdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub name: String,
    pub price: String,
    pub rating: String,
    pub features: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Flights(String),
    Accommodation(Vec<Listing>),
    Experiences(Vec<String>),
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// One section per crew task, labelled with the agent's role.
    Breakdown(Vec<(String, Section)>),
    Raw(String),
    Unparsed(String),
}

fn blocks(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|b| !b.is_empty())
}

/// Reads `key: value` lines; keys lose list markers and become snake_case.
pub fn parse_fields(block: &str) -> Vec<(String, String)> {
    block
        .lines()
        .filter_map(|line| line.split_once(": "))
        .map(|(key, value)| {
            let key = key
                .trim_matches(|c: char| c == ' ' || c == '-' || c == '*')
                .to_lowercase()
                .replace(' ', "_");
            (key, value.trim().to_string())
        })
        .collect()
}

pub fn parse_listing(block: &str, index: usize) -> Listing {
    let fields = parse_fields(block);
    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| fields.iter().find(|(key, _)| key == k))
            .map(|(_, v)| v.clone())
    };
    let na = || "N/A".to_string();

    Listing {
        name: field(&["listing_name"]).unwrap_or_else(|| format!("Accommodation {}", index + 1)),
        price: field(&["total_price", "price_per_night"]).unwrap_or_else(na),
        rating: field(&["rating"]).unwrap_or_else(na),
        features: field(&["key_features"]).unwrap_or_else(na),
        link: field(&["direct_booking_link"]).unwrap_or_else(na),
    }
}

fn section_for(agent: &str, raw: &str) -> Section {
    if agent.contains("Flight") {
        Section::Flights(raw.to_string())
    } else if agent.contains("Accommodation") || agent.contains("Airbnb") {
        Section::Accommodation(
            blocks(raw)
                .enumerate()
                .map(|(i, block)| parse_listing(block, i))
                .collect(),
        )
    } else if agent.contains("Experience") || agent.contains("Brave Search") {
        Section::Experiences(blocks(raw).map(str::to_string).collect())
    } else {
        Section::Other(raw.to_string())
    }
}

pub fn parse_plan(output: &str) -> Plan {
    let Ok(crew) = serde_json::from_str::<CrewOutput>(output) else {
        return Plan::Unparsed(output.to_string());
    };

    if crew.tasks_output.is_empty() {
        if crew.raw.is_empty() {
            return Plan::Unparsed(output.to_string());
        }
        return Plan::Raw(crew.raw);
    }

    Plan::Breakdown(
        crew.tasks_output
            .iter()
            .map(|task| (task.agent.clone(), section_for(&task.agent, &task.raw)))
            .collect(),
    )
}

pub fn print_plan(plan: &Plan) {
    match plan {
        Plan::Breakdown(sections) => {
            for (agent, section) in sections {
                render::heading(agent);
                print_section(section);
                println!();
            }
        }
        Plan::Raw(raw) => {
            render::heading("Raw Output");
            println!("{}", raw);
        }
        Plan::Unparsed(raw) => {
            render::warning("Failed to parse the agent output.");
            println!("{}", raw);
        }
    }
}

fn print_section(section: &Section) {
    match section {
        Section::Flights(text) => {
            println!("{}", "Flight Options".bold());
            println!("{}", text);
        }
        Section::Accommodation(listings) => {
            for listing in listings {
                println!("{}", listing.name.as_str().bold());
                println!("  Price: {}", listing.price);
                println!("  Rating: {}", listing.rating);
                println!("  Features: {}", listing.features);
                println!("  Link: {}", listing.link);
            }
        }
        Section::Experiences(items) => {
            for item in items {
                println!("- {}", item);
            }
        }
        Section::Other(text) => println!("{}", text),
    }
}

fn prompt(label: &str, hint: &str) -> Result<String> {
    let text = if hint.is_empty() {
        format!("{}: ", label)
    } else {
        format!("{} {}: ", label, format!("[{}]", hint).dim())
    };
    Ok(read_line(&text)?.unwrap_or_default())
}

fn read_form(today: NaiveDate) -> Result<TravelForm> {
    Ok(TravelForm {
        departure: prompt("Departure city", "")?,
        destination: prompt("Destination city", "")?,
        start_date: prompt("Start date", &today.to_string())?,
        end_date: prompt("End date", "same as start")?,
        num_travelers: prompt("Travelers", "1")?,
        attractions: prompt("Attractions, comma separated", &ATTRACTIONS.join(", "))?,
        accommodation_type: prompt("Accommodation type", &ACCOMMODATION_TYPES.join("/"))?,
    })
}

pub async fn interactive_travel(client: McpClient) -> Result<()> {
    render::heading("Travel planner");
    println!("Plan flights, stays and local experiences for your trip.");
    connect(&client).await;
    println!();

    let today = Local::now().date_naive();
    let input = match read_form(today)?.to_input(today) {
        Ok(input) => input,
        Err(e) => {
            render::warning(&e.to_string());
            return Ok(());
        }
    };

    println!();
    match call_with_indicator(&client, TRAVEL_TOOL, payload(&input)?).await {
        Ok(output) => print_plan(&parse_plan(&output)),
        Err(e) => render::error(&e),
    }
    Ok(())
}

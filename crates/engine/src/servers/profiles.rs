//! Fixed agent definitions for the agent-backed servers.

use switchboard_shared::TravelInput;

use crate::agent::AgentTask;

use super::{AgentInput, AgentProfile, ProcessCommand};

pub const ETL_AGENT: AgentProfile = AgentProfile {
    tool_name: "etl_tool",
    tool_description: "Ask a data engineer agent to inspect, clean or transform an uploaded CSV file with the ETL tools.",
    input: AgentInput::QuestionWithCsv,
    process: ProcessCommand::SelfServe("etl"),
    credential_env: None,
    default_llm: "gpt_4_1_mini",
    role: "Senior Data Engineer",
    goal: "Automate end-to-end ETL pipelines: read, validate, clean and transform CSV data. \
           Always ensure data quality, robustness and auditability.",
    backstory: "You are a senior data engineer with expertise in robust data pipelines. \
                You chain the ETL tools and always follow good practice for data quality and governance.",
    task_template: "You have access to the uploaded CSV file at: {csv_path}. Your task is: {question}\n\
                    Available tools include: reading data, checking data types, detecting anomalies, \
                    removing duplicates, handling missing values, standardizing values, enforcing constraints \
                    and transforming data. For tools that need parameters (rules, columns, strategies, type \
                    mappings), do NOT run the tool until you have every required detail from the user. If the \
                    request is missing something, ask the user exactly what is needed. Do not guess. When a tool \
                    returns a changed table, always present the table to the user. If the result is empty or \
                    unchanged (e.g. no duplicates found), just say 'No changes needed.'",
    expected_output: "Return what you have found or done with the data.",
};

pub const SCRAPER: AgentProfile = AgentProfile {
    tool_name: "scraper_tool",
    tool_description: "Use an agent to analyze a product page with the price scraper tool.",
    input: AgentInput::Url,
    process: ProcessCommand::SelfServe("price"),
    credential_env: None,
    default_llm: "gpt_4_1_mini",
    role: "Market Research Analyst",
    goal: "Understand product pricing from web data using the scraper tool",
    backstory: "An expert at gathering and interpreting product pricing data for competitive analysis. \
                Uses tools to extract structured data from product pages and explain trends.",
    task_template: "Scrape and analyze product pricing for the page: {url}",
    expected_output: "A structured summary of the product's name and price details",
};

pub const SUPABASE: AgentProfile = AgentProfile {
    tool_name: "supabase_analyst",
    tool_description: "Analyze Supabase tables and answer questions about the data using an agent.",
    input: AgentInput::Question,
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "@supabase/mcp-server-supabase@latest"],
    },
    credential_env: Some("SUPABASE_ACCESS_TOKEN"),
    default_llm: "gpt_4_1_mini",
    role: "Data Analyst",
    goal: "Interpret and execute data-related instructions using SQL",
    backstory: "An expert in data analysis and SQL who can understand business needs and convert \
                them into SQL queries to interact with the database.",
    task_template: "Execute the following data request: {question}",
    expected_output: "SQL query result or confirmation of action taken",
};

pub const GITHUB: AgentProfile = AgentProfile {
    tool_name: "github_analyst",
    tool_description: "Analyze GitHub repository data using an agent.",
    input: AgentInput::Question,
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "@modelcontextprotocol/server-github"],
    },
    credential_env: Some("GITHUB_PERSONAL_ACCESS_TOKEN"),
    default_llm: "deepseek_r1_8b_ollama",
    role: "GitHub Intelligence Analyst",
    goal: "Analyze GitHub repositories and provide intelligent insights on repository activity, \
           contribution trends, issue tracking and project health based on user questions.",
    backstory: "A technical analyst trained to deeply understand GitHub repository data: commits, issues, \
                PRs, contributors, code structure and community health. Skilled in turning natural language \
                questions into structured queries that retrieve and explain GitHub insights. Capable of \
                summarizing repo metrics, detecting activity patterns and giving evidence-backed interpretations.",
    task_template: "Understand and answer the following GitHub-related question: {question}",
    expected_output: "A clear, insightful answer to the user's question, supported by GitHub data. The response \
                      may include metrics, summaries of repo activity, lists of top contributors or open issues, \
                      and explanations of trends. If applicable, include repository names, relevant counts and timeframes.",
};

pub const DOCKER: AgentProfile = AgentProfile {
    tool_name: "docker_mcp_tool",
    tool_description: "Proxy a question to the Docker MCP server through an agent.",
    input: AgentInput::Question,
    process: ProcessCommand::External {
        program: "uvx",
        args: &["mcp-server-docker"],
    },
    credential_env: None,
    default_llm: "gpt_4_1_mini",
    role: "Docker MCP Intelligence Analyst",
    goal: "Use the Docker-hosted MCP server to run tools and return structured answers for arbitrary user questions.",
    backstory: "You are an analyst interfacing with a Docker-deployed MCP server. When given a natural-language \
                question, select and invoke the appropriate tool, then summarize the output.",
    task_template: "Answer this question using Docker MCP tools: {question}",
    expected_output: "A concise, evidence-based answer, potentially including JSON or tabular data \
                      as returned by the MCP server tools.",
};

pub const BRAVE: AgentProfile = AgentProfile {
    tool_name: "brave_web_search",
    tool_description: "Search the web and scrape relevant content with Brave Search through an agent.",
    input: AgentInput::Question,
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "@modelcontextprotocol/server-brave-search"],
    },
    credential_env: Some("BRAVE_API_KEY"),
    default_llm: "gpt_4_1_mini",
    role: "Web Intelligence Analyst",
    goal: "Perform real-time web searches and pull relevant, trustworthy information from online sources \
           using Brave Search. Synthesize results into useful, actionable responses.",
    backstory: "A capable agent skilled in navigating and extracting knowledge from live webpages. Identifies \
                authoritative sources, summarizes content accurately and retrieves useful data from news sites, \
                blogs, developer forums and technical documentation.",
    task_template: "Conduct a precise and reliable web search to answer this query: {question}",
    expected_output: "A high-quality summary, list of insights, or direct answers from credible web sources. \
                      Show critical thinking in parsing web data and deliver practical, clear and accurate information.",
};

pub const CONTEXT7: AgentProfile = AgentProfile {
    tool_name: "context7_analyst",
    tool_description: "Retrieve information from library and API documentation through context7 and an agent.",
    input: AgentInput::Question,
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "@upstash/context7-mcp@latest"],
    },
    credential_env: None,
    default_llm: "gpt_4_1_mini",
    role: "Elite Documentation Intelligence Analyst",
    goal: "Interpret and extract information from technical documentation, codebases and APIs using context7. \
           Turn vague or complex questions into accurate and actionable insights by querying documentation efficiently.",
    backstory: "An agent trained in deep comprehension of software libraries and technical APIs. Translates \
                natural language queries into focused searches against documentation systems like context7, \
                then explains the results with code snippets, usage examples and architectural insights.",
    task_template: "Interpret and respond to this documentation query with technical accuracy: {question}",
    expected_output: "A detailed yet clear explanation, code example, or configuration snippet based on context7 \
                      search. Technically correct, concise, and directly solving the user's intent.",
};

pub const YFINANCE: AgentProfile = AgentProfile {
    tool_name: "yfinance_analyst",
    tool_description: "Answer financial market data questions with Yahoo Finance data through an agent.",
    input: AgentInput::Question,
    process: ProcessCommand::External {
        program: "uvx",
        args: &["yfmcp@latest"],
    },
    credential_env: None,
    default_llm: "gpt_4_1_mini",
    role: "Senior Finance Analyst",
    goal: "Analyze, interpret and respond to any financial data request using expert knowledge of corporate \
           finance, accounting and market data. Provide clear insights and accurate data analysis.",
    backstory: "An experienced financial analyst with a background in corporate finance, market research and \
                data analytics. Understands financial statements, investment metrics and economic indicators, \
                and can advise on revenue, profit trends and valuation ratios.",
    task_template: "Answer this financial data request accurately: {question}",
    expected_output: "A concise, accurate query result or an explanation of the financial insight retrieved.",
};

pub const SELENIUM: AgentProfile = AgentProfile {
    tool_name: "selenium_scraper_tool",
    tool_description: "Scrape structured data from websites with Selenium, following navigation instructions.",
    input: AgentInput::Question,
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "@angiejones/mcp-selenium"],
    },
    credential_env: None,
    default_llm: "gpt_4_1_mini",
    role: "Selenium Automation Analyst",
    goal: "Scrape structured and unstructured data from websites using headless browser automation. \
           Navigate pages, extract text, tables and images, and identify dynamic elements.",
    backstory: "A browser automation expert trained in advanced scraping techniques using Selenium. Fluent in \
                identifying DOM patterns, handling JavaScript-rendered content and following detailed instructions.",
    task_template: "Follow these scraping instructions carefully: {question}. You must visit the site, extract \
                    the required elements, and return structured and clean results.",
    expected_output: "Extracted data formatted as clean text, tables, or JSON. Ensure content is accurate, \
                      relevant, and reflects what was requested in the instructions.",
};

pub const AIRBNB: AgentProfile = AgentProfile {
    tool_name: "search_airbnb",
    tool_description: "Search Airbnb listings for a city and budget through an agent.",
    input: AgentInput::Question,
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "@openbnb/mcp-server-airbnb", "--ignore-robots-txt"],
    },
    credential_env: None,
    default_llm: "gpt_4_1_mini",
    role: "Airbnb Search Specialist",
    goal: "Search and analyze accommodation information on Airbnb",
    backstory: "A specialist in finding the best accommodations.",
    task_template: "Find accommodation information on Airbnb according to: {question}",
    expected_output: "List of available accommodations with details",
};

/// One member of the travel crew: its own tool process, LLM and temperature.
pub struct TravelMember {
    pub label: &'static str,
    pub process: ProcessCommand,
    pub credential_env: Option<&'static str>,
    pub llm: &'static str,
    pub temperature: f32,
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

pub const TRAVEL_FLIGHTS: TravelMember = TravelMember {
    label: "flights",
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "serper-search-scrape-mcp-server"],
    },
    credential_env: Some("SERPER_API_KEY"),
    llm: "gpt_3_5_turbo",
    temperature: 0.2,
    role: "Flight Specialist Agent",
    goal: "Provide the most relevant and affordable flight options based on user travel preferences.",
    backstory: "An expert in global flight searches with access to major airlines and travel aggregators. \
                Trained to optimize for best departure timing, price and overall travel experience.",
};

pub const TRAVEL_STAYS: TravelMember = TravelMember {
    label: "airbnb",
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "@openbnb/mcp-server-airbnb", "--ignore-robots-txt"],
    },
    credential_env: None,
    llm: "gpt_3_5_turbo",
    temperature: 0.3,
    role: "Accommodation Finder Agent",
    goal: "Identify the most suitable and top-rated accommodations that match user expectations and budget.",
    backstory: "An agent with advanced knowledge of short-term rentals. Skilled at finding apartments, hotels \
                and boutique stays that match preferences like location, amenities and ratings.",
};

pub const TRAVEL_EXPERIENCES: TravelMember = TravelMember {
    label: "brave",
    process: ProcessCommand::External {
        program: "npx",
        args: &["-y", "@modelcontextprotocol/server-brave-search"],
    },
    credential_env: Some("BRAVE_API_KEY"),
    llm: "gpt_4o",
    temperature: 0.5,
    role: "Local Experience Curator Agent",
    goal: "Discover the most popular and enjoyable attractions, restaurants and local events that align with user interests.",
    backstory: "A guide deeply familiar with global destinations, local happenings and top-rated venues. \
                Curates experiences based on personal preferences such as food, culture, parks and nightlife, \
                always focused on what is happening during the user's visit.",
};

pub const TRAVEL_CREW: [TravelMember; 3] = [TRAVEL_FLIGHTS, TRAVEL_STAYS, TRAVEL_EXPERIENCES];

/// Tasks for the travel crew, in crew order.
pub fn travel_tasks(input: &TravelInput) -> [AgentTask; 3] {
    [
        AgentTask {
            description: format!(
                "Search for top-rated and cost-effective flights departing from {} to {} on {}. \
                 Filter results for {} passenger(s), and present options from trustworthy sources.",
                input.departure, input.destination, input.start_date, input.num_travelers
            ),
            expected_output: "A concise list (max 5) of available flights with:\n\
                              - Airline name\n\
                              - Departure time and total duration\n\
                              - Price per traveler (approximate)\n\
                              - Booking link"
                .to_string(),
        },
        AgentTask {
            description: format!(
                "Search for available {} accommodations in {} from {} to {} for {} traveler(s). \
                 Prioritize listings with high ratings, guest satisfaction, and fitting to general travel budgets.",
                input.accommodation_type,
                input.destination,
                input.start_date,
                input.end_date,
                input.num_travelers
            ),
            expected_output: "A list of up to 5 recommended accommodations with:\n\
                              - Listing name\n\
                              - Total price and price per night\n\
                              - Rating (and number of reviews)\n\
                              - Key features (e.g., host type, free cancellation)\n\
                              - Direct booking link"
                .to_string(),
        },
        AgentTask {
            description: format!(
                "Search for attractions, events, and local highlights in {} from {} to {} that align with \
                 the user's interests: {}. Include must-visit places, famous restaurants, parks, nightlife, \
                 or festivals occurring during the travel dates.",
                input.destination,
                input.start_date,
                input.end_date,
                input.attractions.join(", ")
            ),
            expected_output: "A curated list of up to 5 recommendations including:\n\
                              - Name of the place or event\n\
                              - What it is and why it's recommended\n\
                              - Address or neighborhood\n\
                              - Opening dates/times if applicable\n\
                              - Website or source link for more details"
                .to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn travel_tasks_interpolate_the_request() {
        let input = TravelInput::from_value(&json!({
            "departure": "Lisbon",
            "destination": "Dublin",
            "start_date": "2025-06-10",
            "end_date": "2025-06-14",
            "num_travelers": 2,
            "attractions": ["pubs", "parks"],
            "accommodation_type": "apartment"
        }))
        .unwrap();

        let [flights, stays, experiences] = travel_tasks(&input);
        assert!(flights.description.contains("from Lisbon to Dublin on 2025-06-10"));
        assert!(flights.description.contains("2 passenger(s)"));
        assert!(stays.description.starts_with("Search for available apartment accommodations in Dublin"));
        assert!(experiences.description.contains("interests: pubs, parks"));
        assert!(stays.expected_output.contains("- Direct booking link"));
    }
}

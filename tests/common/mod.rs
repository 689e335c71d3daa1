use std::{
    collections::HashMap,
    fmt::Write as _,
    fs,
    io::{self, BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    path::{Path, PathBuf},
    process::{Command, Output},
    thread,
};

use chrono::{Datelike, NaiveDate, TimeDelta};
use serde_json::{Value, json};
use tempfile::TempDir;

type Result<T = ()> = anyhow::Result<T>;

const HEADER: &str = "Account Holder,Account Number,Interval Start Date/Time,Net Consumption (kWh),\
                      Demand (kW),Power Factor (%),Estimated Usage,Service Address,City";

/// Daily mean temperature served by the weather stub.
pub fn daily_temperature(date: NaiveDate) -> f64 {
    f64::from(date.day()) - 4.5
}

/// Local Open-Meteo lookalike: answers every request with generated temperatures.
pub struct WeatherStub {
    pub url: String,
}

impl WeatherStub {
    pub fn spawn() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let url = format!("http://{}/v1/archive", listener.local_addr()?);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let _ = respond(stream);
            }
        });
        Ok(Self { url })
    }
}

fn respond(mut stream: TcpStream) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line == "\r\n" {
            break;
        }
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or_default();
    let query: HashMap<&str, &str> = target
        .split_once('?')
        .map(|(_, query)| query)
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();
    let body = build_body(&query).to_string();
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    )?;
    stream.flush()
}

fn build_body(query: &HashMap<&str, &str>) -> Value {
    let parse = |key| query.get(key).and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok());
    let (Some(since), Some(until)) = (parse("start_date"), parse("end_date")) else {
        return json!({ "error": true, "reason": "missing dates" });
    };
    let dates = since.iter_days().take_while(|date| *date <= until);
    if query.contains_key("hourly") {
        let (time, temperature): (Vec<String>, Vec<f64>) = dates
            .flat_map(|date| (0..24).map(move |hour| (date, hour)))
            .map(|(date, hour)| (format!("{date}T{hour:02}:00"), f64::from(hour)))
            .unzip();
        json!({ "hourly": { "time": time, "temperature_2m": temperature } })
    } else {
        let (time, temperature): (Vec<String>, Vec<f64>) =
            dates.map(|date| (date.to_string(), daily_temperature(date))).unzip();
        json!({ "daily": { "time": time, "temperature_2m_mean": temperature } })
    }
}

/// Temporary working directory of a single run.
pub struct Workspace {
    directory: TempDir,
    weather_url: String,
}

impl Workspace {
    pub fn new(weather_url: impl Into<String>) -> Result<Self> {
        Ok(Self { directory: tempfile::tempdir()?, weather_url: weather_url.into() })
    }

    /// Write the file under `input/` and return its path relative to the workspace.
    pub fn add_input(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let relative = Path::new("input").join(name);
        fs::create_dir_all(self.directory.path().join("input"))?;
        fs::write(self.directory.path().join(&relative), contents)?;
        Ok(relative)
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.directory.path().join(relative)
    }

    pub fn run(&self, args: &[&str]) -> Result<Output> {
        let output = Command::new(env!("CARGO_BIN_EXE_hydrograph"))
            .args(args)
            .current_dir(self.directory.path())
            .env("WEATHER_API_URL", &self.weather_url)
            .env("WEATHER_TIMEOUT", "5s")
            .env("RUST_LOG", "warn")
            .env_remove("INPUT_DIR")
            .env_remove("OUTPUT_DIR")
            .env_remove("CHART_FONT")
            .output()?;
        Ok(output)
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Hourly export with the same consumption for every hour.
pub fn hourly_csv(since: NaiveDate, n_days: i64, consumption: f64) -> String {
    let mut csv = format!("{HEADER}\n");
    for date in (0..n_days).map(|day| since + TimeDelta::days(day)) {
        for hour in 0..24 {
            let _ = writeln!(
                csv,
                "Jane Doe,12345,{date} {hour:02}:00,{consumption},1.2,98,N,123 Main St,SQUAMISH",
            );
        }
    }
    csv
}

/// Daily export, the consumption is computed from the day index.
pub fn daily_csv(since: NaiveDate, n_days: i64, consumption: impl Fn(i64) -> f64) -> String {
    let mut csv = format!("{HEADER}\n");
    for day in 0..n_days {
        let _ = writeln!(
            csv,
            "Jane Doe,12345,{},{},,,N,123 Main St,SQUAMISH",
            since + TimeDelta::days(day),
            consumption(day),
        );
    }
    csv
}

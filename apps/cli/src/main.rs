use std::{
    io::{self, BufRead, Write},
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    CalendarClient, ClientError, DraggedItem, EventBadge, GridGeometry, HttpEventBackend,
    ScreenPoint, ViewMode,
};
use shared::{
    domain::{EventId, EventRecord},
    time::{format_naive, parse_timestamp},
};
use tracing_subscriber::EnvFilter;

type Client = CalendarClient<HttpEventBackend>;

#[derive(Parser, Debug)]
#[command(about = "Manage calendar events on an event service")]
struct Cli {
    #[arg(long, env = "CALENDAR_SERVER_URL", default_value = "http://localhost:5000")]
    server_url: String,
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum View {
    Day,
    Week,
    Month,
}

impl From<View> for ViewMode {
    fn from(view: View) -> Self {
        match view {
            View::Day => ViewMode::Day,
            View::Week => ViewMode::Week,
            View::Month => ViewMode::Month,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every stored event, in store order.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Events visible in a day, week or month window.
    Agenda {
        #[arg(long, value_enum, default_value = "month")]
        view: View,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    Show {
        id: String,
    },
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: String,
        #[arg(long, value_parser = parse_time)]
        start: NaiveDateTime,
        #[arg(long, value_parser = parse_time)]
        end: NaiveDateTime,
        #[arg(long)]
        color: Option<String>,
    },
    /// Replace an event's fields; omitted fields keep their current values.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveDateTime>,
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveDateTime>,
        #[arg(long)]
        color: Option<String>,
    },
    Move {
        id: String,
        #[arg(long, value_parser = parse_time)]
        start: NaiveDateTime,
        #[arg(long, value_parser = parse_time)]
        end: NaiveDateTime,
    },
    Resize {
        id: String,
        #[arg(long, value_parser = parse_time)]
        end: NaiveDateTime,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveDateTime>,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Create an event as if an item were dropped at pixel (x, y) of the grid.
    Drop {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(long, value_enum, default_value = "week")]
        view: View,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        top: f64,
        #[arg(long, default_value_t = 0.0)]
        left: f64,
        #[arg(long, default_value_t = 120.0)]
        column_width: f64,
        #[arg(long, default_value_t = 100.0)]
        row_height: f64,
    },
    /// Delete every event that ended before `--now` (default: current local time).
    PurgePast {
        #[arg(long, value_parser = parse_time)]
        now: Option<NaiveDateTime>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let backend =
        HttpEventBackend::with_timeout(&cli.server_url, Duration::from_secs(cli.timeout_secs))?;
    let today = Local::now().date_naive();
    let mut client = CalendarClient::new(backend, today);
    client
        .load()
        .await
        .with_context(|| format!("loading events from {}", cli.server_url))?;

    if let Err(err) = run(&mut client, cli.command, today).await {
        if matches!(err.downcast_ref::<ClientError>(), Some(ClientError::Cancelled)) {
            println!("cancelled");
            return Ok(());
        }
        return Err(err);
    }
    Ok(())
}

async fn run(client: &mut Client, command: Command, today: NaiveDate) -> Result<()> {
    match command {
        Command::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(client.state.events())?);
            } else {
                client.state.events().iter().for_each(print_event);
            }
        }
        Command::Agenda { view, date } => {
            client.state.set_view(view.into());
            client.state.go_to(date.unwrap_or(today));
            let window = client.state.window();
            println!("{} .. {}", window.start, window.end);
            for event in client.state.visible_events() {
                let badge = EventBadge::from(event);
                println!(
                    "{} {}  {} [{}] {}",
                    event.start.date_naive(),
                    badge.time_label,
                    badge.title,
                    event.category,
                    badge.color
                );
            }
        }
        Command::Show { id } => {
            let details = client.select_event(&EventId(id), ScreenPoint::default())?;
            for line in details.lines() {
                println!("{line}");
            }
        }
        Command::Add {
            title,
            category,
            start,
            end,
            color,
        } => {
            client.select_slot(start, end);
            if let Some(form) = client.state.form_mut() {
                form.title = title;
                form.category = category;
                form.color = color;
            }
            print_event(&client.submit_form().await?);
        }
        Command::Edit {
            id,
            title,
            category,
            start,
            end,
            color,
        } => {
            let form = client.open_edit_form(&EventId(id))?;
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(category) = category {
                form.category = category;
            }
            if let Some(start) = start {
                form.start = start;
            }
            if let Some(end) = end {
                form.end = end;
            }
            if color.is_some() {
                form.color = color;
            }
            print_event(&client.submit_form().await?);
        }
        Command::Move { id, start, end } => {
            let notice = client.move_event(&EventId(id), start, end).await?;
            println!("{}", notice.message());
        }
        Command::Resize { id, end, start } => {
            let event_id = EventId(id);
            let start = match start {
                Some(start) => start,
                None => client
                    .state
                    .event(&event_id)
                    .map(|event| event.start.naive_utc())
                    .ok_or_else(|| ClientError::UnknownEvent(event_id.clone()))?,
            };
            let notice = client.resize_event(&event_id, start, end).await?;
            println!("{}", notice.message());
        }
        Command::Delete { id, yes } => {
            let event_id = EventId(id);
            client
                .delete_event(&event_id, |event| yes || confirm_delete(event))
                .await?;
            println!("deleted {event_id}");
        }
        Command::Drop {
            x,
            y,
            view,
            date,
            title,
            category,
            color,
            top,
            left,
            column_width,
            row_height,
        } => {
            client.state.set_view(view.into());
            client.state.go_to(date.unwrap_or(today));
            let geometry = GridGeometry {
                top,
                left,
                column_width,
                row_height,
                ..GridGeometry::default()
            };
            let item = DraggedItem {
                title,
                category,
                color,
            };
            let created = client
                .drop_external(&item, ScreenPoint::new(x, y), &geometry)
                .await?;
            print_event(&created);
        }
        Command::PurgePast { now } => {
            let now = now.unwrap_or_else(|| Local::now().naive_local());
            let report = client.purge_past_events(now).await;
            println!(
                "deleted {} past event(s), {} failed",
                report.deleted.len(),
                report.failed.len()
            );
        }
    }
    Ok(())
}

fn print_event(event: &EventRecord) {
    println!(
        "{}  {} -> {}  {} [{}] {}",
        event.id,
        format_naive(event.start.naive_utc()),
        format_naive(event.end.naive_utc()),
        event.title,
        event.category,
        event.display_color()
    );
}

fn confirm_delete(event: &EventRecord) -> bool {
    print!("Delete \"{}\"? [y/N] ", event.title);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}

fn parse_time(value: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(value)
        .map(|timestamp| timestamp.naive_utc())
        .ok_or_else(|| format!("invalid timestamp {value:?}"))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| format!("invalid date {value:?}: {err}"))
}

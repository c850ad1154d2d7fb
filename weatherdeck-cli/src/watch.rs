//! Interactive session.
//!
//! One task owns the controller and reacts to events: typed lines, fetch
//! completions and the location result. Fetches run as separate tasks, so
//! input stays live while a request is in flight.

use chrono::Local;
use std::io::{BufRead, IsTerminal};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use weatherdeck_core::{
    Coordinates, FetchTicket, Mode, QueryController, QueryError, ViewState, WeatherResponse,
    input::{SearchBox, date_picker_visible},
};

use crate::{cli::QueryArgs, render};

const HELP: &str = "\
Type a city name (or lat,lon) and press Enter to search.
  :current | :forecast | :historical   switch tab
  :date YYYY-MM-DD                     pick a past date (historical tab)
  :unit                                toggle metric / imperial
  :help                                show this help
  :quit                                exit";

#[derive(Debug)]
enum Event {
    Line(String),
    InputClosed,
    Fetched(u64, Result<WeatherResponse, QueryError>),
    Located(Result<Coordinates, QueryError>),
}

#[derive(Debug, PartialEq, Eq)]
enum Action<'a> {
    Search(&'a str),
    Mode(Mode),
    Date(&'a str),
    ToggleUnit,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_line(line: &str) -> Action<'_> {
    let Some(command) = line.trim().strip_prefix(':') else {
        return Action::Search(line);
    };

    let (name, arg) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    match name {
        "current" => Action::Mode(Mode::Current),
        "forecast" => Action::Mode(Mode::Forecast),
        "historical" | "past" => Action::Mode(Mode::Historical),
        "date" => Action::Date(arg.trim()),
        "unit" => Action::ToggleUnit,
        "help" | "h" => Action::Help,
        "quit" | "q" | "exit" => Action::Quit,
        _ => Action::Unknown(name),
    }
}

pub async fn run(location: Option<String>, args: QueryArgs) -> anyhow::Result<()> {
    let mut controller = args.controller(None)?;
    let color = std::io::stdout().is_terminal();
    let (tx, mut rx) = unbounded_channel();
    let mut search = SearchBox::default();
    let mut input_open = true;

    spawn_input_reader(tx.clone());
    tracing::info!(mode = %controller.mode(), unit = %controller.unit(), "interactive session started");
    println!("{HELP}\n");

    match location {
        Some(location) => {
            search.set_text(location);
            if let Some(query) = search.submit() {
                let ticket = controller.submit_query(&query);
                spawn_fetch(&controller, ticket, &tx);
            }
        }
        None => {
            let geolocator = args.geolocator()?;
            if controller.begin_locating(geolocator.is_supported()) {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = geolocator.locate().await;
                    let _ = tx.send(Event::Located(result));
                });
            }
        }
    }
    println!("{}", render::render(&controller.view(), color));

    while let Some(event) = rx.recv().await {
        let redraw = match event {
            Event::Line(line) => match parse_line(&line) {
                Action::Quit => break,
                Action::Help => {
                    println!("{HELP}");
                    false
                }
                Action::Unknown(name) => {
                    eprintln!("Unknown command ':{name}'. Type :help for a list.");
                    false
                }
                Action::Search(text) => {
                    search.set_text(text);
                    match search.submit() {
                        Some(query) => {
                            let ticket = controller.submit_query(&query);
                            spawn_fetch(&controller, ticket, &tx)
                        }
                        None => false,
                    }
                }
                Action::Mode(mode) => {
                    let ticket = controller.change_mode(mode);
                    spawn_fetch(&controller, ticket, &tx);
                    true
                }
                Action::ToggleUnit => {
                    let ticket = controller.toggle_unit();
                    spawn_fetch(&controller, ticket, &tx);
                    true
                }
                Action::Date(value) => {
                    if !date_picker_visible(controller.mode()) {
                        eprintln!("Switch to the historical tab (:historical) to pick a date.");
                        false
                    } else {
                        controller.set_today(Local::now().date_naive());
                        match controller
                            .date_picker()
                            .parse(value)
                            .and_then(|date| controller.change_date(date))
                        {
                            Ok(ticket) => {
                                spawn_fetch(&controller, ticket, &tx);
                                true
                            }
                            Err(err) => {
                                eprintln!("{err}");
                                false
                            }
                        }
                    }
                }
            },
            Event::InputClosed => {
                input_open = false;
                false
            }
            Event::Fetched(seq, result) => controller.settle(seq, result),
            Event::Located(result) => {
                let ticket = controller.finish_locating(result);
                spawn_fetch(&controller, ticket, &tx);
                true
            }
        };

        if redraw {
            println!("{}", render::render(&controller.view(), color));
        }

        if session_done(input_open, controller.state()) {
            break;
        }
    }

    Ok(())
}

/// Once input is exhausted the session ends, but only after pending work
/// has settled.
fn session_done(input_open: bool, state: &ViewState) -> bool {
    !input_open && !matches!(state, ViewState::Loading { .. } | ViewState::Locating)
}

/// Returns whether a fetch was started.
fn spawn_fetch(
    controller: &QueryController,
    ticket: Option<FetchTicket>,
    tx: &UnboundedSender<Event>,
) -> bool {
    let Some(ticket) = ticket else {
        return false;
    };

    let provider = controller.provider();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = provider.fetch(&ticket.query).await;
        let _ = tx.send(Event::Fetched(ticket.seq, result));
    });
    true
}

// Stdin is read on a plain thread; lines are forwarded to the event loop.
fn spawn_input_reader(tx: UnboundedSender<Event>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });
}

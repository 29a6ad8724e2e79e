//! CLI command runners.
//!
//! Each `run_*` function backs one `swx` subcommand and prints to stdout.
//! Everything except `login` and `logout` sits behind the session gate.

use anyhow::{bail, Result};

use swapi_explorer_core::browser::{BrowserState, BrowserView, Completion};
use swapi_explorer_core::collection::{FullCollection, LoadOutcome};
use swapi_explorer_core::detail::{load_detail, CharacterDetail};
use swapi_explorer_core::engine;
use swapi_explorer_core::models::{FilterOption, FilterOptions, FilterSelection};
use swapi_explorer_core::options::derive_filter_options;
use swapi_explorer_core::pagination::PageMarker;
use swapi_explorer_core::source::ResourceSource;

use crate::client::SwapiClient;
use crate::config::Config;
use crate::session::SessionManager;

pub fn run_login(config: &Config, username: &str, password: &str) -> Result<()> {
    let manager = SessionManager::new(config);
    let session = match manager.login(username, password) {
        Ok(s) => s,
        Err(_) => bail!("Invalid credentials: username and password must not be empty."),
    };
    println!(
        "Logged in as {} (token valid until {}).",
        session.username(),
        session.expires_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

pub fn run_logout(config: &Config) -> Result<()> {
    let manager = SessionManager::new(config);
    if manager.logout()? {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}

pub fn run_whoami(config: &Config) -> Result<()> {
    let manager = SessionManager::new(config);
    let session = manager.require()?;
    println!("username: {}", session.username());
    println!(
        "expires:  {}",
        session.expires_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

/// Arguments of `swx list`.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub page: u64,
    pub search: Option<String>,
    pub selection: FilterSelection,
    pub json: bool,
}

/// Build the browser view for one page plus any search/filter.
///
/// The full-collection walk only runs when a search or filter is active,
/// concurrently with the page fetch. A failed walk degrades to narrowing
/// the current page.
pub async fn browse<S: ResourceSource + ?Sized>(source: &S, args: &ListArgs) -> BrowserView {
    let mut state = BrowserState::new();
    let mut ticket = state.request_page(args.page);
    if let Some(t) = state.set_query(args.search.clone().unwrap_or_default()) {
        ticket = t;
    }
    if let Some(t) = state.set_selection(args.selection.clone()) {
        ticket = t;
    }

    let narrowed = engine::is_narrowed(state.query(), state.selection());
    let (page, walk) = tokio::join!(source.fetch_page(ticket.page), async {
        if narrowed {
            Some(FullCollection::load(source).await)
        } else {
            None
        }
    });

    if let Completion::Failed(message) = state.complete(ticket, page) {
        tracing::debug!(%message, "page fetch failed");
    }
    if let Some(walk) = walk {
        if let LoadOutcome::Failed { message } = state.apply_full_collection(walk) {
            eprintln!("Warning: filters unavailable ({}); narrowing the current page only.", message);
        }
    }

    // `list` never derives filter options, so none are pending.
    let mut view = state.view();
    view.filters_loading = false;
    view
}

pub async fn run_list(config: &Config, args: ListArgs) -> Result<()> {
    SessionManager::new(config).require()?;
    let client = SwapiClient::new(config)?;
    let view = browse(&client, &args).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }
    if let Some(error) = &view.error {
        bail!("{}\nRetry with: swx list --page {}", error, args.page.max(1));
    }
    if !args.json {
        print_view(&view);
    }
    Ok(())
}

fn print_view(view: &BrowserView) {
    if view.characters.is_empty() {
        println!("No characters found.");
    } else {
        println!("{:<28} {:<10} {}", "NAME", "BORN", "URL");
        for c in &view.characters {
            println!("{:<28} {:<10} {}", c.name, c.birth_year, c.url);
        }
    }

    match &view.pagination {
        Some(p) => {
            let strip: Vec<String> = p
                .window
                .iter()
                .map(|m| match m {
                    PageMarker::Page(n) if *n == p.current_page => format!("[{}]", n),
                    PageMarker::Page(n) => n.to_string(),
                    PageMarker::Ellipsis => "...".to_string(),
                })
                .collect();
            println!();
            println!(
                "Page {} of {}   {}",
                p.current_page,
                p.total_pages,
                strip.join(" ")
            );
        }
        None => {
            println!();
            println!("{} result(s)", view.characters.len());
        }
    }
}

pub async fn run_filters(config: &Config, json: bool) -> Result<()> {
    SessionManager::new(config).require()?;
    let client = SwapiClient::new(config)?;

    let mut full = FullCollection::new();
    if let LoadOutcome::Failed { message } = full.populate(&client).await {
        bail!("Filters unavailable: {}", message);
    }
    let options = derive_filter_options(
        &client,
        full.characters(),
        config.filters.max_concurrent_resolutions,
    )
    .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        print_options(&options);
    }
    Ok(())
}

fn print_options(options: &FilterOptions) {
    let sections: [(&str, &[FilterOption]); 3] = [
        ("Homeworlds", options.homeworlds.as_slice()),
        ("Species", options.species.as_slice()),
        ("Films", options.films.as_slice()),
    ];
    for (i, (title, list)) in sections.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} ({})", title, list.len());
        for o in list.iter() {
            println!("  {:<32} {}", o.label, o.url);
        }
    }
}

pub async fn run_show(config: &Config, url: &str, json: bool) -> Result<()> {
    SessionManager::new(config).require()?;
    let client = SwapiClient::new(config)?;
    let detail = load_detail(&client, url).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        print_detail(&detail);
    }
    Ok(())
}

fn print_detail(d: &CharacterDetail) {
    println!("{}", d.name);
    println!("{}", "=".repeat(d.name.chars().count()));
    println!("Height:      {}", d.height);
    println!("Mass:        {}", d.mass);
    println!("Birth year:  {}", d.birth_year);
    println!("Films:       {}", d.films);
    println!("Date added:  {}", d.date_added);
    if let Some(hw) = &d.homeworld {
        println!();
        println!("Homeworld");
        println!("  Name:        {}", hw.name);
        println!("  Terrain:     {}", hw.terrain);
        println!("  Climate:     {}", hw.climate);
        println!("  Population:  {}", hw.population);
    }
}

/// Build a selection from CLI flags, treating blank values as unset.
pub fn selection_from_flags(
    homeworld: Option<String>,
    species: Option<String>,
    film: Option<String>,
) -> FilterSelection {
    FilterSelection::new(homeworld, species, film)
}

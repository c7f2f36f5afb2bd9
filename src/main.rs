//! Command-line front end for the product catalog.
//!
//! ```text
//! gestly [--config PATH] [key=value ...] <command>
//!
//! commands:
//!   list                                                   first page of the listing
//!   more N                                                 listing plus N further pages
//!   search TEXT                                            name-prefix search
//!   add NAME PURCHASE SELLING STOCK WEIGHT UNIT BRANCH     add a product
//!   delete ID                                              delete a product
//! ```
//!
//! Runs one controller against the file-backed store in the data directory,
//! waits for the view to settle and prints it.

use gestly::app::ProductViewState;
use gestly::observability::init_tracing;
use gestly::{initialize, Config, GestlyError, Result, Session, User, WeightUnit};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;

/// How long to wait for the store before giving up.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

const USAGE: &str = "usage: gestly [--config PATH] [key=value ...] \
[list | more N | search TEXT | add NAME PURCHASE SELLING STOCK WEIGHT UNIT BRANCH | delete ID]";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    List,
    More(usize),
    Search(String),
    Add(NewProduct),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq)]
struct NewProduct {
    name: String,
    purchase_price: String,
    selling_price: String,
    stock: String,
    net_weight: String,
    weight_unit: WeightUnit,
    branch: String,
}

#[derive(Debug)]
struct CliArgs {
    config_path: Option<PathBuf>,
    overrides: BTreeMap<String, String>,
    command: Command,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut config_path = None;
        let mut overrides = BTreeMap::new();
        let mut rest = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--config" {
                let path = args
                    .next()
                    .ok_or_else(|| GestlyError::Config("--config needs a path".to_string()))?;
                config_path = Some(PathBuf::from(path));
            } else if let (true, Some((key, value))) = (rest.is_empty(), arg.split_once('=')) {
                overrides.insert(key.to_string(), value.to_string());
            } else {
                rest.push(arg);
            }
        }

        Ok(Self {
            config_path,
            overrides,
            command: parse_command(&rest)?,
        })
    }
}

fn parse_command(words: &[String]) -> Result<Command> {
    let usage = || GestlyError::Config(USAGE.to_string());

    match words {
        [] => Ok(Command::List),
        [cmd] if cmd == "list" => Ok(Command::List),
        [cmd, pages] if cmd == "more" => pages
            .parse()
            .map(Command::More)
            .map_err(|_| GestlyError::Config(format!("not a page count: {pages}"))),
        [cmd, text @ ..] if cmd == "search" && !text.is_empty() => Ok(Command::Search(text.join(" "))),
        [cmd, name, purchase, selling, stock, weight, unit, branch] if cmd == "add" => {
            let weight_unit = WeightUnit::parse(unit)
                .ok_or_else(|| GestlyError::Validation(format!("unknown weight unit: {unit}")))?;
            Ok(Command::Add(NewProduct {
                name: name.clone(),
                purchase_price: purchase.clone(),
                selling_price: selling.clone(),
                stock: stock.clone(),
                net_weight: weight.clone(),
                weight_unit,
                branch: branch.clone(),
            }))
        }
        [cmd, id] if cmd == "delete" => Ok(Command::Delete(id.clone())),
        _ => Err(usage()),
    }
}

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = Config::load(args.config_path.as_deref(), &args.overrides)?;
    init_tracing(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let services = initialize(&config)?;
        let session = match services.resume()? {
            Some(session) => session,
            None => services.sign_in(local_user())?,
        };
        tracing::debug!(uid = %session.user().uid, command = ?args.command, "running command");

        execute(&session, args.command).await
    })
}

/// The CLI acts as the operating system user.
fn local_user() -> User {
    let name = std::env::var("USER").unwrap_or_else(|_| "local".to_string());
    User::new(format!("local:{name}"), name, String::new())
}

async fn execute(session: &Session, command: Command) -> Result<()> {
    let products = session.products();
    let mut view = products.subscribe();

    products.load_products();
    let listing = settle(&mut view, |v| v.current_page >= 1 && !v.is_loading).await?;

    match command {
        Command::List => print_view(&listing),
        Command::More(pages) => {
            for _ in 0..pages {
                products.load_more_products();
            }
            print_view(&products.view());
        }
        Command::Search(text) => {
            products.search_products(&text);
            let results = settle(&mut view, |v| v.current_page == 0 && !v.is_loading).await?;
            print_view(&results);
        }
        Command::Add(new) => {
            products.edit_form(|form| {
                form.name = new.name;
                form.purchase_price = new.purchase_price;
                form.selling_price = new.selling_price;
                form.stock = new.stock;
                form.net_weight = new.net_weight;
                form.weight_unit = new.weight_unit;
                form.branch = new.branch;
            });
            let id = products.add_product().await?;
            println!("added {id}");

            let reloaded = settle(&mut view, |v| v.current_page >= 1 && !v.is_loading).await?;
            print_view(&reloaded);
        }
        Command::Delete(id) => {
            products.delete_product(&id).await?;
            println!("deleted {id}");

            let reloaded = settle(&mut view, |v| v.current_page >= 1 && !v.is_loading).await?;
            print_view(&reloaded);
        }
    }
    Ok(())
}

/// Waits until the view satisfies `done` or shows an error.
async fn settle(
    view: &mut watch::Receiver<ProductViewState>,
    mut done: impl FnMut(&ProductViewState) -> bool,
) -> Result<ProductViewState> {
    let finished = move |v: &ProductViewState| v.error_message().is_some() || done(v);
    let state = tokio::time::timeout(SETTLE_TIMEOUT, view.wait_for(finished))
        .await
        .map_err(|_| GestlyError::RemoteUnavailable("timed out waiting for the store".to_string()))?
        .map_err(|_| GestlyError::Session("product session closed".to_string()))?;

    if let Some(message) = state.error_message() {
        return Err(GestlyError::RemoteUnavailable(message.to_string()));
    }
    Ok((*state).clone())
}

fn print_view(view: &ProductViewState) {
    if view.products.is_empty() {
        println!("no products");
    }

    for product in &view.products {
        println!(
            "{id:<18}  {name:<24} {price:>10.2}  stock {stock:>4} {status:<12} margin {margin:>6.1}%  {branch}",
            id = product.id,
            name = product.name,
            price = product.selling_price,
            stock = product.stock,
            status = product.stock_status().label(),
            margin = product.profit_margin(),
            branch = product.branch,
        );
    }

    if view.is_searching() {
        println!("-- {} result(s) for \"{}\"", view.products.len(), view.search_query);
    } else {
        let more = if view.has_more { ", more available" } else { "" };
        println!("-- showing {} (page {}{more})", view.products.len(), view.current_page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Result<CliArgs> {
        CliArgs::parse(words.iter().map(ToString::to_string))
    }

    #[test]
    fn parses_overrides_and_command() {
        let parsed = args(&["--config", "/tmp/g.toml", "page_size=5", "search", "cafe", "molido"]).unwrap();
        assert_eq!(parsed.config_path, Some(PathBuf::from("/tmp/g.toml")));
        assert_eq!(parsed.overrides.get("page_size").map(String::as_str), Some("5"));
        assert_eq!(parsed.command, Command::Search("cafe molido".to_string()));
    }

    #[test]
    fn defaults_to_list() {
        assert_eq!(args(&[]).unwrap().command, Command::List);
        assert_eq!(args(&["more", "2"]).unwrap().command, Command::More(2));
    }

    #[test]
    fn add_requires_all_fields_and_known_unit() {
        let ok = args(&["add", "Coffee", "100", "150", "10", "500", "MG", "Centro"]).unwrap();
        assert!(matches!(ok.command, Command::Add(ref p) if p.weight_unit == WeightUnit::Mg));

        assert!(args(&["add", "Coffee", "100"]).is_err());
        assert!(args(&["add", "Coffee", "100", "150", "10", "500", "KG", "Centro"]).is_err());
        assert!(args(&["frobnicate"]).is_err());
    }
}

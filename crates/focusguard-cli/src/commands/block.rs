use clap::Subcommand;
use focusguard_core::{BlockedSite, Config, Store};

use super::{open_store, print_json, CommandResult};

#[derive(Subcommand)]
pub enum BlockAction {
    /// Block a site during work sessions
    Add {
        /// Site URL or bare hostname (e.g. "reddit.com")
        url: String,
    },
    /// Remove a site from the list
    Remove {
        /// Entry id or URL
        site: String,
    },
    /// Re-enable a disabled entry
    Enable {
        /// Entry id or URL
        site: String,
    },
    /// Keep an entry but stop blocking it
    Disable {
        /// Entry id or URL
        site: String,
    },
    /// Print the block list as JSON
    List,
}

fn position(sites: &[BlockedSite], site: &str) -> Result<usize, String> {
    sites
        .iter()
        .position(|s| s.id == site || s.url == site)
        .ok_or_else(|| format!("no blocked site matches '{site}'"))
}

pub fn run(action: BlockAction) -> CommandResult {
    let config = Config::load_or_default();
    let store = open_store(&config)?;
    let mut sites = store.blocked_sites()?;

    match action {
        BlockAction::Add { url } => {
            if sites.iter().any(|s| s.url == url) {
                return Err(format!("'{url}' is already blocked").into());
            }
            let site = BlockedSite::new(url);
            site.validate()?;
            sites.push(site.clone());
            store.set_blocked_sites(&sites)?;
            print_json(&site)?;
        }
        BlockAction::Remove { site } => {
            let removed = sites.remove(position(&sites, &site)?);
            store.set_blocked_sites(&sites)?;
            print_json(&removed)?;
        }
        BlockAction::Enable { site } => set_active(&store, &mut sites, &site, true)?,
        BlockAction::Disable { site } => set_active(&store, &mut sites, &site, false)?,
        BlockAction::List => print_json(&sites)?,
    }
    Ok(())
}

fn set_active(
    store: &Store,
    sites: &mut [BlockedSite],
    site: &str,
    is_active: bool,
) -> CommandResult {
    let index = position(sites, site)?;
    sites[index].is_active = is_active;
    store.set_blocked_sites(sites)?;
    print_json(&sites[index])?;
    Ok(())
}

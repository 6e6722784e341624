use std::env;

use log::error;

use recipe_finder::{client_from_config, AppConfig, PageEntry, Paginator, SearchOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Usage: recipe-finder <query> [page]
    let args: Vec<String> = env::args().collect();
    let query = args
        .get(1)
        .ok_or("Please provide a search term as an argument")?;
    let page: usize = args.get(2).map(|p| p.parse()).transpose()?.unwrap_or(1);

    let config = AppConfig::load()?;
    let client = client_from_config(&config)?;

    // a comma-separated query is an ingredient list, e.g. "rice,chicken"
    let outcome = if query.contains(',') {
        client.search_by_ingredients(query).await
    } else {
        client.search_by_keyword(query).await
    };

    let recipes = match outcome {
        Ok(SearchOutcome::Results(recipes)) => recipes,
        Ok(_) => {
            println!("No recipes found for \"{query}\". Try another keyword!");
            return Ok(());
        }
        Err(err) if err.is_quota_exceeded() => {
            error!("provider quota exhausted");
            eprintln!("Daily API limit exceeded. Please try again tomorrow.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let pager = Paginator::new(config.page_size);
    let total_pages = pager.total_pages(recipes.len());
    // out-of-range page requests fall back to the first page
    let page = pager.change_page(page, recipes.len()).unwrap_or(1);

    println!("Found {} recipes for \"{query}\"\n", recipes.len());
    for (offset, recipe) in pager.page_slice(&recipes, page).iter().enumerate() {
        let rank = (page - 1) * pager.page_size() + offset + 1;
        println!("{rank:>3}. {}", recipe.title);
        if let Some(minutes) = recipe.ready_in_minutes {
            println!("     ready in {minutes} min, serves {}", recipe.servings);
        }
    }

    // pagination rail, e.g. "1 2 3 4 ... 12"
    let rail: Vec<String> = pager
        .page_numbers(page, total_pages)
        .into_iter()
        .map(|entry| match entry {
            PageEntry::Number(n) if n == page => format!("[{n}]"),
            PageEntry::Number(n) => n.to_string(),
            PageEntry::Ellipsis => "...".to_string(),
        })
        .collect();
    println!("\nPage {page} / {total_pages}   {}", rail.join(" "));

    Ok(())
}

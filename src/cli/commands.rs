use crate::app::{AppContext, Result, SyncError};
use crate::config::Config;
use crate::domain::{FeedItem, PageKey, PostMeta};
use crate::sync::{ListingKind, RemoteListing};

pub fn list_wikis(ctx: &AppContext) -> Result<()> {
    if ctx.registry.is_empty() {
        println!("No wikis configured");
        return Ok(());
    }

    for wiki in ctx.registry.iter() {
        println!(
            "{} ({})\n  {}",
            wiki.name,
            wiki.encoding.label(),
            wiki.url
        );
    }
    Ok(())
}

pub async fn get_page(
    ctx: &AppContext,
    wiki: &str,
    page: &str,
    force: bool,
    must_exist: bool,
) -> Result<()> {
    let wiki = ctx.wiki(wiki)?;
    let key = PageKey::new(wiki.name.clone(), page);

    let content = if ctx.workspace.exists(&key)? {
        if !force {
            println!(
                "Local copy exists: {} (use --force to fetch it again)",
                ctx.workspace.page_path(&key)?.display()
            );
            return Ok(());
        }
        let mut session = ctx.engine.resume(key.clone());
        ctx.engine.reload(wiki, &mut session).await?
    } else {
        if must_exist {
            ctx.engine.ensure_page_exists(wiki, page).await?;
        }
        ctx.engine.load(wiki, page).await?.content
    };

    let path = ctx.workspace.write(&key, &content, wiki.encoding)?;
    ctx.save_state()?;

    let revision = ctx.engine.revisions().get(&key).unwrap_or_default();
    println!("Fetched {} (revision {})", key, revision);
    println!("  {}", path.display());
    Ok(())
}

pub async fn post_page(ctx: &AppContext, wiki: &str, page: &str, meta: PostMeta) -> Result<()> {
    let wiki = ctx.wiki(wiki)?;
    let key = PageKey::new(wiki.name.clone(), page);
    let path = local_copy(ctx, &key)?;

    let mut session = ctx.engine.resume(key.clone());
    let receipt = ctx.engine.post(wiki, &mut session, &path, &meta).await?;
    ctx.save_state()?;

    println!(
        "Posted {} (revision {} -> {})",
        key, receipt.previous_revision, receipt.revision
    );
    Ok(())
}

pub async fn preview_page(
    ctx: &AppContext,
    wiki: &str,
    page: &str,
    meta: PostMeta,
    open_browser: bool,
) -> Result<()> {
    let wiki = ctx.wiki(wiki)?;
    let key = PageKey::new(wiki.name.clone(), page);
    let path = local_copy(ctx, &key)?;

    let mut session = ctx.engine.resume(key);
    let html = ctx.engine.preview(wiki, &mut session, &path, &meta).await?;

    if open_browser {
        let data_dir = Config::data_dir()?;
        std::fs::create_dir_all(&data_dir)?;
        let preview_path = data_dir.join("preview.html");
        std::fs::write(&preview_path, html)?;
        open::that(&preview_path)?;
        println!("Opened {}", preview_path.display());
    } else {
        println!("{}", html);
    }
    Ok(())
}

pub fn page_status(ctx: &AppContext, wiki: &str, page: &str) -> Result<()> {
    let wiki = ctx.wiki(wiki)?;
    let key = PageKey::new(wiki.name.clone(), page);

    match ctx.engine.revisions().record(&key) {
        Some(record) if record.is_new() => println!("{}: new page, not on the server yet", key),
        Some(record) => println!(
            "{}: revision {}{}",
            key,
            record.revision,
            record
                .last_modified
                .map(|t| format!(" from {}", t))
                .unwrap_or_default()
        ),
        None => println!("{}: not loaded", key),
    }

    if ctx.workspace.exists(&key)? {
        let text = ctx.workspace.read(&key, wiki.encoding)?;
        println!(
            "  {} ({} lines)",
            ctx.workspace.page_path(&key)?.display(),
            text.lines().count()
        );
    } else {
        println!("  no local copy");
    }
    Ok(())
}

pub async fn page_history(ctx: &AppContext, wiki: &str, page: &str, json: bool) -> Result<()> {
    let wiki = ctx.wiki(wiki)?;
    let items = ctx.engine.history(wiki, page).await?;
    print_items(&format!("History of {}", page), &items, json)
}

pub async fn show_listing(ctx: &AppContext, wiki: &str, kind: ListingKind, json: bool) -> Result<()> {
    let wiki = ctx.wiki(wiki)?;
    let mut listing = RemoteListing::new(wiki.clone(), kind);
    listing.reload(&ctx.engine).await?;
    print_items(&listing.title(), listing.items(), json)
}

pub async fn list_index(ctx: &AppContext, wiki: &str, json: bool) -> Result<()> {
    let wiki = ctx.wiki(wiki)?;
    let names = ctx.engine.page_names(wiki).await?;

    if json {
        println!("{}", to_json(&*names)?);
        return Ok(());
    }
    for name in names.iter() {
        println!("{}", name);
    }
    println!("{} pages", names.len());
    Ok(())
}

fn local_copy(ctx: &AppContext, key: &PageKey) -> Result<std::path::PathBuf> {
    if !ctx.workspace.exists(key)? {
        return Err(SyncError::Other(format!(
            "No local copy of {}; run `oddsync get {} '{}'` first",
            key, key.wiki, key.page
        )));
    }
    ctx.workspace.page_path(key)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| SyncError::Other(e.to_string()))
}

fn print_items(header: &str, items: &[FeedItem], json: bool) -> Result<()> {
    if json {
        println!("{}", to_json(items)?);
        return Ok(());
    }

    println!("{}", header);
    if items.is_empty() {
        println!("  (nothing)");
        return Ok(());
    }

    for item in items {
        println!("{}", format_item(item));
    }
    Ok(())
}

fn format_item(item: &FeedItem) -> String {
    let date = item
        .modified_at()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| " ".repeat(16));
    let minor = if item.is_minor { "m" } else { " " };

    let mut line = format!("{} {} {}", date, minor, item.title);
    if let Some(revision) = &item.revision {
        line.push_str(&format!(" [{}]", revision));
    }
    if item.generator.is_some() {
        line.push_str(&format!(" . . . . {}", item.display_author()));
    }
    if let Some(description) = &item.description {
        line.push_str(&format!(" - {}", description));
    }
    line
}

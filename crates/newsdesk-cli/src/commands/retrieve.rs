//! Direct retrieval commands

use crate::app::{CategoryArgs, NearbyArgs, OutputFormat, ScoreArgs, SearchArgs, SourceArgs};
use crate::output::format_articles;
use anyhow::Result;
use newsdesk_core::{ArticleStore, Database, GeoPoint, NewsDeskError, QueryConfig};

pub async fn run_category(
    args: CategoryArgs,
    db: &Database,
    config: &QueryConfig,
    format: OutputFormat,
) -> Result<()> {
    let limit = config.clamp_retrieval(args.limit);
    let articles = db.by_category(&args.category, limit).await?;
    print!("{}", format_articles(&articles, format)?);
    Ok(())
}

pub async fn run_search(
    args: SearchArgs,
    db: &Database,
    config: &QueryConfig,
    format: OutputFormat,
) -> Result<()> {
    let query = args.query.join(" ");
    let limit = config.clamp_retrieval(args.limit);
    let articles = db.by_search(&query, limit).await?;
    print!("{}", format_articles(&articles, format)?);
    Ok(())
}

pub async fn run_source(
    args: SourceArgs,
    db: &Database,
    config: &QueryConfig,
    format: OutputFormat,
) -> Result<()> {
    let limit = config.clamp_retrieval(args.limit);
    let articles = db.by_source(&args.source, limit).await?;
    print!("{}", format_articles(&articles, format)?);
    Ok(())
}

pub async fn run_score(
    args: ScoreArgs,
    db: &Database,
    config: &QueryConfig,
    format: OutputFormat,
) -> Result<()> {
    if !(0.0..=1.0).contains(&args.min_score) {
        return Err(
            NewsDeskError::Validation("Minimum score must be between 0 and 1".to_string()).into(),
        );
    }
    let limit = config.clamp_retrieval(args.limit);
    let articles = db.by_score(args.min_score, limit).await?;
    print!("{}", format_articles(&articles, format)?);
    Ok(())
}

pub async fn run_nearby(
    args: NearbyArgs,
    db: &Database,
    config: &QueryConfig,
    format: OutputFormat,
) -> Result<()> {
    let point = GeoPoint::new(args.lat, args.lon);
    point.validate()?;
    if args.radius <= 0.0 {
        return Err(NewsDeskError::Validation("Radius must be positive".to_string()).into());
    }
    let limit = config.clamp_retrieval(args.limit);
    let articles = db.nearby(point.lat, point.lon, args.radius, limit).await?;
    print!("{}", format_articles(&articles, format)?);
    Ok(())
}

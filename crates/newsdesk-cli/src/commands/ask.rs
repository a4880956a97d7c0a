//! Smart query command

use crate::app::{AskArgs, OutputFormat};
use crate::output::format_smart_response;
use anyhow::Result;
use newsdesk_core::{Config, Database, GeoPoint, SmartQueryRequest, SmartQueryService};
use std::sync::Arc;

pub async fn run(args: AskArgs, db: &Database, config: &Config, format: OutputFormat) -> Result<()> {
    let service = SmartQueryService::from_config(Arc::new(db.clone()), config)?;

    let mut request = SmartQueryRequest::new(args.query.join(" "))
        .with_summary(!args.no_summary)
        .with_analysis(args.analysis);
    if let Some(limit) = args.limit {
        request = request.with_limit(limit);
    }
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        request = request.with_location(GeoPoint::new(lat, lon));
    }

    let response = service.process_smart_query(request).await?;
    print!("{}", format_smart_response(&response, format)?);
    Ok(())
}

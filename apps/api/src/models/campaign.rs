use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One marketing campaign. Dates and list fields arrive as free text from
/// the campaign planner export, so they stay TEXT and are parsed on use.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CampaignRow {
    pub campaign_id: String,
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Comma-separated tracked platforms, e.g. "instagram,whatsapp,tv".
    pub platforms: Option<String>,
    /// Comma-separated TV regions the campaign booked airtime in.
    pub tv_regions: Option<String>,
}

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

// === Game records ===

/// A connected player as seen on the wire. Every field is supplied by the
/// owning client; the server stores the record wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct Player {
    pub x: i32,
    pub y: i32,
    pub score: u32,
    pub id: String,
}

impl Player {
    pub fn new(id: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            score: 0,
            id: id.into(),
        }
    }
}

/// The single live collectible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct Item {
    pub x: i32,
    pub y: i32,
    pub value: u32,
    /// Unique per spawn; only used to tell one item from its replacement.
    #[ts(type = "number")]
    pub id: u64,
}

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    /// Sent once right after the socket opens, carrying the identity the
    /// client must use in its `new-player` record.
    #[serde(rename = "connected")]
    Connected { id: String },
    #[serde(rename = "init")]
    Init(InitMsg),
    #[serde(rename = "update")]
    Update { players: Vec<Player> },
    #[serde(rename = "item-update")]
    ItemUpdate(Item),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct InitMsg {
    pub id: String,
    pub players: Vec<Player>,
    pub item: Item,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "new-player")]
    NewPlayer(Player),
    #[serde(rename = "update-player")]
    UpdatePlayer(Player),
    /// Clients echo the item they touched; only its id is read, and an id
    /// that is not a non-negative integer reads as absent.
    #[serde(rename = "item-collected")]
    ItemCollected {
        #[serde(default)]
        #[serde(deserialize_with = "lenient_item_id")]
        #[ts(type = "number | null")]
        id: Option<u64>,
    },
}

fn lenient_item_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Echo {
        Id(u64),
        Other(IgnoredAny),
    }

    Ok(match Option::<Echo>::deserialize(deserializer)? {
        Some(Echo::Id(id)) => Some(id),
        Some(Echo::Other(_)) | None => None,
    })
}

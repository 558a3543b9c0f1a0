use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InstrumentsResponse {
    #[serde(default)]
    pub results: Vec<InstrumentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct InstrumentEntry {
    pub id: String,
}

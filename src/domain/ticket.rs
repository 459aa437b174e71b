/// A ticket that exists on the tracker.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub key: String,
    pub url: String,
}

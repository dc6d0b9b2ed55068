use serde::Serialize;

/// Identifies one fetch on one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequestToken(u64);

/// Issues tokens for a single fetch lane. Only the most recently issued
/// token is current; results carrying older tokens are stale.
#[derive(Debug, Clone, Default)]
pub struct RequestLane {
    issued: u64,
}

impl RequestLane {
    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Makes every issued token stale without starting a request.
    pub fn invalidate(&mut self) {
        self.issued += 1;
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Fresh,
    /// Superseded by a newer request; state untouched
    Stale,
}

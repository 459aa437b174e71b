use tokio::sync::{mpsc, oneshot};

/// Result of a request sent to another context. A missing listener is a
/// representable outcome, not an error: the channel may be closed before
/// the send, or the responder may drop the reply slot.
#[derive(Debug)]
pub enum Outcome<T> {
    Answered(T),
    NoResponder,
}

impl<T> Outcome<T> {
    pub fn answered(self) -> Option<T> {
        match self {
            Outcome::Answered(value) => Some(value),
            Outcome::NoResponder => None,
        }
    }
}

/// Sends a request carrying a reply slot and suspends until the response
/// arrives or the channel indicates nobody is listening.
pub(crate) async fn request<Req, T>(
    tx: &mpsc::Sender<Req>,
    make: impl FnOnce(oneshot::Sender<T>) -> Req,
) -> Outcome<T> {
    let (reply_tx, reply_rx) = oneshot::channel();
    if tx.send(make(reply_tx)).await.is_err() {
        return Outcome::NoResponder;
    }
    match reply_rx.await {
        Ok(value) => Outcome::Answered(value),
        Err(_) => Outcome::NoResponder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Ping {
        Ask { reply: oneshot::Sender<u32> },
    }

    #[tokio::test]
    async fn answered_round_trip() {
        let (tx, mut rx) = mpsc::channel::<Ping>(4);
        tokio::spawn(async move {
            while let Some(Ping::Ask { reply }) = rx.recv().await {
                let _ = reply.send(7);
            }
        });

        match request(&tx, |reply| Ping::Ask { reply }).await {
            Outcome::Answered(value) => assert_eq!(value, 7),
            Outcome::NoResponder => panic!("expected an answer"),
        }
    }

    #[tokio::test]
    async fn closed_channel_is_no_responder() {
        let (tx, rx) = mpsc::channel::<Ping>(4);
        drop(rx);
        assert!(request(&tx, |reply| Ping::Ask { reply })
            .await
            .answered()
            .is_none());
    }

    #[tokio::test]
    async fn dropped_reply_is_no_responder() {
        let (tx, mut rx) = mpsc::channel::<Ping>(4);
        tokio::spawn(async move {
            while let Some(Ping::Ask { reply }) = rx.recv().await {
                drop(reply);
            }
        });
        assert!(request(&tx, |reply| Ping::Ask { reply })
            .await
            .answered()
            .is_none());
    }
}

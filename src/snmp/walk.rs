//! Lazy table walks over GetNext

use futures::stream::{self, Stream, TryStreamExt};
use futures::{future, pin_mut};

use super::ber::VarBind;
use super::oid::Oid;
use super::transport::{SnmpTransport, TransportError};

/// Walks the subtree under `root`, one GetNext per item.
///
/// The stream ends cleanly once the agent steps outside `root`, returns a
/// v2 exception value or answers noSuchName. Any other failure is yielded
/// once and ends the stream. Nothing is requested until the stream is
/// polled, so dropping it after a match costs no further round trips.
pub fn walk<'a, T>(
    transport: &'a T,
    root: Oid,
) -> impl Stream<Item = Result<VarBind, TransportError>> + 'a
where
    T: SnmpTransport + ?Sized,
{
    stream::unfold(Some(root.clone()), move |cursor| {
        let root = root.clone();
        async move {
            let requested = cursor?;
            match transport.get_next(&requested).await {
                Ok(vb) if vb.value.is_exception() || !vb.oid.is_under(&root) => None,
                Ok(vb) if vb.oid <= requested => {
                    let err = TransportError::NotIncreasing {
                        requested,
                        returned: vb.oid,
                    };
                    Some((Err(err), None))
                }
                Ok(vb) => {
                    let next = vb.oid.clone();
                    Some((Ok(vb), Some(next)))
                }
                Err(TransportError::NoSuchName) => None,
                Err(e) => Some((Err(e), None)),
            }
        }
    })
}

/// First row of the walk that satisfies `predicate`.
pub async fn first_match<S, F>(rows: S, mut predicate: F) -> Result<Option<VarBind>, TransportError>
where
    S: Stream<Item = Result<VarBind, TransportError>>,
    F: FnMut(&VarBind) -> bool,
{
    let matches = rows.try_filter(move |vb| future::ready(predicate(vb)));
    pin_mut!(matches);
    matches.try_next().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::ber::SnmpValue;
    use crate::snmp::oid::IF_DESCR;
    use crate::snmp::testing::TableAgent;
    use crate::snmp::transport::MockSnmpTransport;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    fn descr(index: u32, text: &str) -> (Oid, SnmpValue) {
        (
            Oid::from(IF_DESCR).child(&[index]),
            SnmpValue::OctetString(text.as_bytes().to_vec()),
        )
    }

    #[tokio::test]
    async fn stops_at_end_of_subtree() {
        let agent = TableAgent::new([
            descr(1, "lo"),
            descr(2, "eth0"),
            // next column of ifTable
            ("1.3.6.1.2.1.2.2.1.3.1".parse().unwrap(), SnmpValue::Integer(24)),
        ]);

        let rows: Vec<_> = walk(&agent, Oid::from(IF_DESCR)).collect().await;
        let oids: Vec<String> = rows
            .into_iter()
            .map(|r| r.unwrap().oid.to_string())
            .collect();

        assert_eq!(
            oids,
            vec!["1.3.6.1.2.1.2.2.1.2.1", "1.3.6.1.2.1.2.2.1.2.2"]
        );
        assert_eq!(agent.requests(), 3);
    }

    #[tokio::test]
    async fn end_of_agent_mib_ends_walk_cleanly() {
        let agent = TableAgent::new([descr(1, "lo")]);
        let rows: Vec<_> = walk(&agent, Oid::from(IF_DESCR)).collect().await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_ok());
    }

    #[tokio::test]
    async fn exception_value_ends_walk() {
        let mut mock = MockSnmpTransport::new();
        mock.expect_get_next().times(1).returning(|oid| {
            Ok(VarBind::new(oid.child(&[1]), SnmpValue::EndOfMibView))
        });

        let rows: Vec<_> = walk(&mock, Oid::from(IF_DESCR)).collect().await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn non_advancing_agent_is_an_error() {
        let looping: Oid = Oid::from(IF_DESCR).child(&[5]);
        let mut mock = MockSnmpTransport::new();
        let reply = looping.clone();
        mock.expect_get_next().times(2).returning(move |_| {
            Ok(VarBind::new(reply.clone(), SnmpValue::Integer(1)))
        });

        let rows: Vec<_> = walk(&mock, Oid::from(IF_DESCR)).collect().await;
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_ok());
        assert!(matches!(
            &rows[1],
            Err(TransportError::NotIncreasing { returned, .. }) if *returned == looping
        ));
    }

    #[tokio::test]
    async fn transport_failure_is_yielded_once() {
        let mut mock = MockSnmpTransport::new();
        mock.expect_get_next()
            .times(1)
            .returning(|_| Err(TransportError::Timeout { attempts: 2 }));

        let rows: Vec<_> = walk(&mock, Oid::from(IF_DESCR)).collect().await;
        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0], Err(TransportError::Timeout { attempts: 2 })));
    }

    #[tokio::test]
    async fn first_match_stops_requesting_after_hit() {
        let agent = TableAgent::new([descr(1, "lo"), descr(2, "eth0"), descr(3, "eth1")]);

        let hit = first_match(walk(&agent, Oid::from(IF_DESCR)), |vb| {
            vb.oid.last_arc() == Some(2)
        })
        .await
        .unwrap();

        assert_eq!(hit.and_then(|vb| vb.value.as_text()), Some("eth0".into()));
        assert_eq!(agent.requests(), 2);
    }
}

use liveclass_core::{IceCandidate, SessionDescription, SessionHandle};
use liveclass_session::{HttpRelay, SignalingRelay};

use crate::integration::init_tracing;
use crate::utils::{RELAY_COOKIE, TestRelayServer};

#[tokio::test]
async fn test_offer_answer_and_candidates_round_trip() -> anyhow::Result<()> {
    init_tracing();

    let (server, base_url) = TestRelayServer::start().await?;
    let relay = HttpRelay::new(format!("{base_url}/"))?;
    let session = SessionHandle::new("class-7");

    relay.join(&session).await?;
    assert!(server.has_room("class-7"));

    assert_eq!(relay.fetch_offer(&session).await?, None);
    // Nothing published yet comes back as an empty body.
    assert_eq!(relay.fetch_answer(&session).await?, None);
    assert!(relay.fetch_candidates(&session).await?.is_empty());

    let offer = SessionDescription::offer("v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\n");
    relay.publish_offer(&session, &offer).await?;
    assert_eq!(relay.fetch_offer(&session).await?, Some(offer));

    let answer = SessionDescription::answer("v=0\r\no=- 2 1 IN IP4 0.0.0.0\r\n");
    relay.publish_answer(&session, &answer).await?;
    assert_eq!(relay.fetch_answer(&session).await?, Some(answer));

    let mut first = IceCandidate::new("candidate:1 1 udp 2122260223 10.0.0.2 51000 typ host");
    first.sdp_mid = Some("0".into());
    first.sdp_mline_index = Some(0);
    let second = IceCandidate::new("candidate:2 1 udp 2122260223 10.0.0.3 51001 typ host");
    relay.publish_candidate(&session, &first).await?;
    relay.publish_candidate(&session, &second).await?;
    assert_eq!(relay.fetch_candidates(&session).await?, vec![first, second]);

    relay.leave(&session).await?;
    assert!(!server.has_room("class-7"));
    Ok(())
}

#[tokio::test]
async fn test_join_cookie_is_sent_back() -> anyhow::Result<()> {
    init_tracing();

    let (server, base_url) = TestRelayServer::start().await?;
    let relay = HttpRelay::new(base_url)?;
    let session = SessionHandle::new("class-8");

    relay.join(&session).await?;
    relay.fetch_offer(&session).await?;
    relay.leave(&session).await?;

    let cookies = server.cookies();
    assert_eq!(cookies.len(), 3);
    assert_eq!(cookies[0], ("join".to_owned(), None));
    for (action, cookie) in &cookies[1..] {
        assert_eq!(cookie.as_deref(), Some(RELAY_COOKIE), "{action} lost the cookie");
    }
    Ok(())
}

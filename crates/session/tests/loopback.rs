//! Zwei Knoten am In-Memory-Netz: Discovery, Handshake, verschluesselter
//! Austausch, Fehlerisolation und Abbau

mod common;

use common::{id, knoten, knoten_mit_config, verbinden, warte_auf, warte_auf_nachricht};
use flurfunk_core::{ConnectionStatus, Message};
use flurfunk_observability::{EventKategorie, EventStufe};
use flurfunk_protocol::{FramingMode, WireMessage};
use flurfunk_session::{MemoryNetwork, SessionConfig, SessionError, SessionEvent};

#[tokio::test(start_paused = true)]
async fn verschluesselter_clip_kommt_an() {
    let netz = MemoryNetwork::neu();
    let (alice, mut ev_a) = knoten(&netz, "alice", "Alice");
    let (bob, mut ev_b) = knoten(&netz, "bob", "Bob");

    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;

    let gesendet = bob.clip_senden(b"hallo flur".to_vec(), 2.5).await.unwrap();
    let empfangen = warte_auf_nachricht(&mut ev_a).await;

    assert_eq!(empfangen.id(), gesendet.id());
    assert_eq!(empfangen.payload(), b"hallo flur");
    assert_eq!(empfangen.sender_id(), &id("bob"));
    assert_eq!(empfangen.sender_name(), "Bob");
    assert_eq!(empfangen.duration_seconds(), 2.5);

    // Kein Klartext-Fallback protokolliert
    let warnungen = bob
        .event_log()
        .nach_kategorie(EventKategorie::Send)
        .into_iter()
        .filter(|e| e.stufe == EventStufe::Warnung)
        .count();
    assert_eq!(warnungen, 0);

    let snap = alice.snapshot().await.unwrap();
    assert_eq!(snap.status, ConnectionStatus::Connected);
    assert_eq!(snap.peers_mit_schluessel, vec![id("bob")]);
    assert_eq!(snap.verbunden[0].display_name, "Bob");
}

#[tokio::test(start_paused = true)]
async fn antwort_in_gegenrichtung() {
    let netz = MemoryNetwork::neu();
    let (alice, mut ev_a) = knoten(&netz, "alice", "Alice");
    let (bob, mut ev_b) = knoten(&netz, "bob", "Bob");
    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;

    let msg = Message::neu(id("alice"), "Alice", vec![9; 1000], 1.0).unwrap();
    alice.send(id("bob"), msg.clone()).await.unwrap();
    let empfangen = warte_auf_nachricht(&mut ev_b).await;
    assert_eq!(empfangen, msg);
}

#[tokio::test(start_paused = true)]
async fn kaputte_nachricht_stoert_folgende_nicht() {
    let netz = MemoryNetwork::neu();
    let (alice, mut ev_a) = knoten(&netz, "alice", "Alice");
    let (bob, mut ev_b) = knoten(&netz, "bob", "Bob");
    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;

    // Verschluesselt markiert, aber Ciphertext passt nicht zum Schluessel
    let vorlage = Message::neu(id("alice"), "Alice", vec![], 1.0).unwrap();
    let gefaelscht = WireMessage::aus_nachricht(&vorlage, vec![0xA5; 48], true);
    netz.rohdaten_zustellen(&id("alice"), &id("bob"), gefaelscht.encode().unwrap());
    netz.rohdaten_zustellen(&id("alice"), &id("bob"), b"kein json".to_vec());

    let verworfen = warte_auf(&mut ev_b, |e| matches!(e, SessionEvent::EmpfangVerworfen { .. })).await;
    assert!(matches!(verworfen, SessionEvent::EmpfangVerworfen { peer, .. } if peer == id("alice")));

    let gut = alice.clip_senden(b"danach".to_vec(), 1.0).await.unwrap();
    let empfangen = warte_auf_nachricht(&mut ev_b).await;
    assert_eq!(empfangen.id(), gut.id());
    assert_eq!(bob.snapshot().await.unwrap().status, ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn trennen_raeumt_beide_seiten_auf() {
    let netz = MemoryNetwork::neu();
    let (alice, mut ev_a) = knoten(&netz, "alice", "Alice");
    let (bob, mut ev_b) = knoten(&netz, "bob", "Bob");
    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;

    bob.disconnect().await.unwrap();
    warte_auf(&mut ev_a, |e| *e == SessionEvent::PeerGetrennt(id("bob"))).await;

    let a = alice.snapshot().await.unwrap();
    assert!(a.verbunden.is_empty());
    assert!(a.peers_mit_schluessel.is_empty());
    // Alice hostet weiterhin
    assert_eq!(a.status, ConnectionStatus::Hosting);

    let b = bob.snapshot().await.unwrap();
    assert_eq!(b.status, ConnectionStatus::Disconnected);
    assert!(b.entdeckt.is_empty());
    assert!(!netz.ist_browsing(&id("bob")));

    // Senden nach dem Trennen
    assert!(matches!(
        bob.clip_senden(vec![1], 1.0).await,
        Err(SessionError::KeinePeers)
    ));
}

#[tokio::test(start_paused = true)]
async fn reconnect_erneuert_schluessel() {
    let netz = MemoryNetwork::neu();
    let (alice, mut ev_a) = knoten(&netz, "alice", "Alice");
    let (bob, mut ev_b) = knoten(&netz, "bob", "Bob");
    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;

    bob.disconnect().await.unwrap();
    warte_auf(&mut ev_a, |e| *e == SessionEvent::PeerGetrennt(id("bob"))).await;

    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;
    bob.clip_senden(b"wieder da".to_vec(), 1.0).await.unwrap();
    assert_eq!(warte_auf_nachricht(&mut ev_a).await.payload(), b"wieder da");
}

#[tokio::test(start_paused = true)]
async fn verschwundener_host_trennt_session() {
    let netz = MemoryNetwork::neu();
    let (alice, mut ev_a) = knoten(&netz, "alice", "Alice");
    let (bob, mut ev_b) = knoten(&netz, "bob", "Bob");
    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;

    netz.entfernen(&id("alice"));
    warte_auf(&mut ev_b, |e| *e == SessionEvent::PeerGetrennt(id("alice"))).await;

    let snap = bob.snapshot().await.unwrap();
    assert!(snap.verbunden.is_empty());
    assert!(snap.entdeckt.is_empty());
    assert_eq!(snap.status, ConnectionStatus::Browsing);
}

#[tokio::test(start_paused = true)]
async fn tagged_framing_zwischen_zwei_knoten() {
    let netz = MemoryNetwork::neu();
    let mut ca = SessionConfig::neu("alice", "Alice");
    ca.framing = FramingMode::Tagged;
    let mut cb = SessionConfig::neu("bob", "Bob");
    cb.framing = FramingMode::Tagged;
    let (alice, mut ev_a) = knoten_mit_config(&netz, ca);
    let (bob, mut ev_b) = knoten_mit_config(&netz, cb);
    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;

    bob.clip_senden(b"mit typ-byte".to_vec(), 0.5).await.unwrap();
    assert_eq!(warte_auf_nachricht(&mut ev_a).await.payload(), b"mit typ-byte");
}

#[tokio::test(start_paused = true)]
async fn sendefehler_wird_gemeldet() {
    let netz = MemoryNetwork::neu();
    let (alice, mut ev_a) = knoten(&netz, "alice", "Alice");
    let (bob, mut ev_b) = knoten(&netz, "bob", "Bob");
    verbinden(&alice, &mut ev_a, &bob, &mut ev_b).await;

    netz.senden_fehler_injizieren(&id("bob"), 1);
    let msg = bob.clip_senden(vec![1, 2, 3], 1.0).await.unwrap();
    let fehler = warte_auf(&mut ev_b, |e| matches!(e, SessionEvent::SendenFehlgeschlagen { .. })).await;
    assert!(matches!(
        fehler,
        SessionEvent::SendenFehlgeschlagen { message_id, .. } if message_id == msg.id()
    ));

    // Naechster Versuch geht durch
    bob.clip_senden(vec![4], 1.0).await.unwrap();
    assert_eq!(warte_auf_nachricht(&mut ev_a).await.payload(), &[4]);
}

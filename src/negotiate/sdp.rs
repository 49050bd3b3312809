//! SDP offer/answer synthesis
//!
//! Builds the minimal well-formed session descriptions the signaling core
//! exchanges. The media plane rewrites transport-level attributes (ICE
//! candidates, DTLS fingerprints) when it attaches; signaling only commits
//! to the media sections and their order.
//!
//! Parsing of client blobs is deliberately shallow: only `m=audio` and
//! `m=video` lines are recognized, everything else is opaque text.

use std::sync::atomic::{AtomicU64, Ordering};

/// Media kind carried by one `m=` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    fn m_line_prefix(&self) -> &'static str {
        match self {
            MediaKind::Audio => "m=audio",
            MediaKind::Video => "m=video",
        }
    }
}

/// Monotonic origin-line session id
static NEXT_ORIGIN_ID: AtomicU64 = AtomicU64::new(1);

fn next_origin_id() -> u64 {
    NEXT_ORIGIN_ID.fetch_add(1, Ordering::Relaxed)
}

fn session_header(origin_id: u64, bundle_mids: &[u32]) -> String {
    let mut sdp = String::new();
    sdp.push_str("v=0\r\n");
    sdp.push_str(&format!("o=- {} 2 IN IP4 127.0.0.1\r\n", origin_id));
    sdp.push_str("s=-\r\n");
    sdp.push_str("t=0 0\r\n");

    if !bundle_mids.is_empty() {
        sdp.push_str("a=group:BUNDLE");
        for mid in bundle_mids {
            sdp.push_str(&format!(" {}", mid));
        }
        sdp.push_str("\r\n");
    }

    sdp
}

fn media_section(kind: MediaKind, mid: u32) -> String {
    let mut sdp = String::new();

    match kind {
        MediaKind::Audio => {
            sdp.push_str("m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n");
            sdp.push_str("c=IN IP4 0.0.0.0\r\n");
            sdp.push_str(&format!("a=mid:{}\r\n", mid));
            sdp.push_str("a=rtpmap:111 opus/48000/2\r\n");
        }
        MediaKind::Video => {
            sdp.push_str("m=video 9 UDP/TLS/RTP/SAVPF 107\r\n");
            sdp.push_str("c=IN IP4 0.0.0.0\r\n");
            sdp.push_str(&format!("a=mid:{}\r\n", mid));
            sdp.push_str("a=rtpmap:107 H264/90000\r\n");
        }
    }
    sdp.push_str("a=sendrecv\r\n");
    sdp.push_str("a=rtcp-mux\r\n");

    sdp
}

fn rejected_section(kind: MediaKind, mid: u32) -> String {
    // Port 0 marks the section as rejected; the m-line must still appear
    // so the answer mirrors the offer's section order.
    let m_line = match kind {
        MediaKind::Audio => "m=audio 0 UDP/TLS/RTP/SAVPF 111\r\n",
        MediaKind::Video => "m=video 0 UDP/TLS/RTP/SAVPF 107\r\n",
    };

    let mut sdp = String::new();
    sdp.push_str(m_line);
    sdp.push_str("c=IN IP4 0.0.0.0\r\n");
    sdp.push_str(&format!("a=mid:{}\r\n", mid));
    sdp.push_str("a=inactive\r\n");

    sdp
}

/// Whether an SDP blob carries an `m=` section of the given kind
pub fn contains_media(sdp: &str, kind: MediaKind) -> bool {
    sdp.lines().any(|line| line.starts_with(kind.m_line_prefix()))
}

/// Media kinds present in an SDP blob, in m-line order
fn media_kinds(sdp: &str) -> Vec<MediaKind> {
    sdp.lines()
        .filter_map(|line| {
            if line.starts_with("m=audio") {
                Some(MediaKind::Audio)
            } else if line.starts_with("m=video") {
                Some(MediaKind::Video)
            } else {
                None
            }
        })
        .collect()
}

/// Synthesize an SDP offer for the requested media kinds
pub fn offer(want_audio: bool, want_video: bool) -> String {
    let mut kinds = Vec::new();
    if want_audio {
        kinds.push(MediaKind::Audio);
    }
    if want_video {
        kinds.push(MediaKind::Video);
    }

    let mids: Vec<u32> = (0..kinds.len() as u32).collect();
    let mut sdp = session_header(next_origin_id(), &mids);
    for (mid, kind) in kinds.into_iter().enumerate() {
        sdp.push_str(&media_section(kind, mid as u32));
    }

    sdp
}

/// Synthesize an SDP answer mirroring the remote offer
///
/// Each `m=` section of the offer is answered in order: accepted when its
/// kind is among the requested ones, rejected (port 0) otherwise. Standard
/// offer/answer rules require the answer to mirror every section.
pub fn answer(remote_offer: &str, want_audio: bool, want_video: bool) -> String {
    let offered = media_kinds(remote_offer);

    let accepted_mids: Vec<u32> = offered
        .iter()
        .enumerate()
        .filter(|(_, kind)| match kind {
            MediaKind::Audio => want_audio,
            MediaKind::Video => want_video,
        })
        .map(|(mid, _)| mid as u32)
        .collect();

    let mut sdp = session_header(next_origin_id(), &accepted_mids);
    for (mid, kind) in offered.into_iter().enumerate() {
        let wanted = match kind {
            MediaKind::Audio => want_audio,
            MediaKind::Video => want_video,
        };
        if wanted {
            sdp.push_str(&media_section(kind, mid as u32));
        } else {
            sdp.push_str(&rejected_section(kind, mid as u32));
        }
    }

    sdp
}

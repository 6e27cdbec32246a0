//! JSON timeline documents

use crate::{Result, Timeline};
use std::io::{Read, Write};

/// Reads a timeline document, restoring stack indices and validating it
pub fn read_timeline<R: Read>(reader: R) -> Result<Timeline> {
    let mut timeline: Timeline = serde_json::from_reader(reader)?;
    timeline.reindex();
    timeline.validate()?;
    Ok(timeline)
}

/// Writes a timeline document as pretty-printed JSON
pub fn write_timeline<W: Write>(mut writer: W, timeline: &Timeline) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, timeline)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ClipView, TimelineQuery};
    use crate::{ClipId, Error};
    use std::io::Cursor;

    const DOCUMENT: &str = r#"{
        "name": "reel 1",
        "duration": 10,
        "tracks": [
            {
                "name": "V1",
                "clips": [
                    { "id": 4, "name": "X", "media": "x.mov", "first": 0, "last": 9, "source_in": 1001.0 }
                ]
            },
            {
                "name": "V2",
                "enabled": false,
                "clips": [
                    { "id": 9, "name": "Y", "media": "y.mov", "first": 3, "last": 6, "source_in": 0.0, "speed": 2.0 }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_read_document() {
        let timeline = read_timeline(Cursor::new(DOCUMENT)).unwrap();

        assert_eq!(timeline.name, "reel 1");
        assert_eq!(timeline.duration(), 10);
        assert!(timeline.tracks()[0].enabled);
        assert!(!timeline.tracks()[1].enabled);

        let y = timeline.clip(ClipId(9)).unwrap();
        assert_eq!(y.owning_track(), 1);
        assert_eq!(y.map_timeline_to_source(4), 2.0);
        assert!(y.is_enabled());
    }

    #[test]
    fn test_write_then_read_keeps_timeline() {
        let timeline = read_timeline(Cursor::new(DOCUMENT)).unwrap();

        let mut buffer = Vec::new();
        write_timeline(&mut buffer, &timeline).unwrap();
        let reread = read_timeline(Cursor::new(buffer)).unwrap();

        assert_eq!(timeline, reread);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let document = DOCUMENT.replace("\"id\": 9", "\"id\": 4");
        let err = read_timeline(Cursor::new(document)).unwrap_err();

        assert!(matches!(err, Error::DuplicateClipId(ClipId(4))));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let document = DOCUMENT.replace("\"first\": 3, \"last\": 6", "\"first\": 6, \"last\": 3");
        let err = read_timeline(Cursor::new(document)).unwrap_err();

        assert!(matches!(err, Error::InvalidRange { first: 6, last: 3 }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = read_timeline(Cursor::new("{ \"name\": ")).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}

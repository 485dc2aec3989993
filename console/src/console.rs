//! Line-oriented console input
//!
//! Each line stands for one button press, text entry or map click of the
//! page the controller replaces.

use thiserror::Error;

use crate::controller::{Command, Mode};
use crate::geo::LngLat;
use crate::map::MapClick;

pub const HELP: &str = "\
Commands:
  mode default|geofence|device   switch interaction mode
  click <lng> <lat>              click the map
  move                           move the pointer over the map
  geofence-id <text>             type into the geofence id box
  device-id <text>               type into the device id box
  commit geofence|device         create the drawn geofence or device
  delete geofence|device <id>    delete by id
  search <term>                  search points of interest
  refresh [geofences|devices|positions]
  status                         show controller state
  help                           show this text
  quit                           exit";

#[derive(Debug, Error, PartialEq)]
pub enum CommandParseError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(Command),
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Result<Input, CommandParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "" => return Ok(Input::Empty),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" => return Ok(Input::Quit),
        "mode" => Command::SetMode(match rest {
            "default" => Mode::Default,
            "geofence" => Mode::CreateGeofence,
            "device" => Mode::CreateDevice,
            _ => return Err(CommandParseError::Usage("mode default|geofence|device")),
        }),
        "click" => Command::Click(MapClick::at(parse_lng_lat(rest)?)),
        "move" => Command::MouseMove,
        // Text boxes take the rest of the line verbatim; trimming is left to commit
        "geofence-id" => Command::SetGeofenceId(rest.to_string()),
        "device-id" => Command::SetDeviceId(rest.to_string()),
        "commit" => match rest {
            "geofence" => Command::CommitGeofence,
            "device" => Command::CommitDevice,
            _ => return Err(CommandParseError::Usage("commit geofence|device")),
        },
        "delete" => match rest.split_once(char::is_whitespace) {
            Some(("geofence", id)) if !id.trim().is_empty() => {
                Command::DeleteGeofence(id.trim().to_string())
            }
            Some(("device", id)) if !id.trim().is_empty() => {
                Command::DeleteDevice(id.trim().to_string())
            }
            _ => return Err(CommandParseError::Usage("delete geofence|device <id>")),
        },
        "search" => Command::Search(rest.to_string()),
        "refresh" => match rest {
            "" | "positions" => Command::RefreshPositions,
            "geofences" => Command::RefreshGeofences,
            "devices" => Command::RefreshDevices,
            _ => {
                return Err(CommandParseError::Usage(
                    "refresh [geofences|devices|positions]",
                ));
            }
        },
        "status" => Command::Snapshot,
        other => return Err(CommandParseError::Unknown(other.to_string())),
    };

    Ok(Input::Command(command))
}

fn parse_lng_lat(args: &str) -> Result<LngLat, CommandParseError> {
    let mut parts = args.split_whitespace();
    let (Some(lng), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CommandParseError::Usage("click <lng> <lat>"));
    };

    let parse = |s: &str| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CommandParseError::InvalidCoordinate(s.to_string()))
    };
    let (lng, lat) = (parse(lng)?, parse(lat)?);

    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(CommandParseError::InvalidCoordinate(format!("{} {}", lng, lat)));
    }
    Ok(LngLat::new(lng, lat))
}

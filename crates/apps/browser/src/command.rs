//! Line-oriented script commands fed to the driver on stdin.
//!
//! ```text
//! pan 37.80 -122.41        drag the map, then report a viewport change
//! zoom 14                  change zoom around the current center
//! resize 1024 768          resize the map panel
//! marker 3                 click the pin labelled 3
//! tile <location-id>       click a tile
//! add <id> <movie> 37.8 -122.4   add one location pin outside a fetch
//! remove <location-id>     remove one location pin
//! search vertigo           type into the search box
//! pick-movie <movie-id>    choose a movie suggestion
//! pick-location <id>       choose a location suggestion
//! open <location-id>       open the movie detail of a tile
//! close                    close the movie detail
//! city <city-id>           switch city
//! clear                    clear all highlights
//! scroll 4                 scroll the tile list to row 4
//! status                   print the session state as JSON
//! quit
//! ```

use foundation::{CityId, Coordinate, LocationId, MovieId};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pan(Coordinate),
    Zoom(u8),
    Resize { width: u32, height: u32 },
    Marker(u32),
    Tile(LocationId),
    Add { id: LocationId, movie: MovieId, at: Coordinate },
    Remove(LocationId),
    Search(String),
    PickMovie(MovieId),
    PickLocation(LocationId),
    Open(LocationId),
    Close,
    City(CityId),
    Clear,
    Scroll(usize),
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    InvalidNumber { arg: &'static str, value: String },
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(word) => write!(f, "unknown command: {word}"),
            CommandError::MissingArgument(arg) => write!(f, "missing argument <{arg}>"),
            CommandError::InvalidNumber { arg, value } => {
                write!(f, "invalid <{arg}>: {value}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

impl std::str::FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();

        match word {
            "" => Err(CommandError::Empty),
            "pan" => {
                let lat = number(args.next(), "lat")?;
                let lng = number(args.next(), "lng")?;
                Ok(Command::Pan(Coordinate::new(lat, lng)))
            }
            "zoom" => Ok(Command::Zoom(number(args.next(), "zoom")?)),
            "resize" => Ok(Command::Resize {
                width: number(args.next(), "width")?,
                height: number(args.next(), "height")?,
            }),
            "marker" => Ok(Command::Marker(number(args.next(), "label")?)),
            "tile" => Ok(Command::Tile(LocationId::new(word_arg(args.next(), "location")?))),
            "add" => {
                let id = LocationId::new(word_arg(args.next(), "location")?);
                let movie = MovieId::new(word_arg(args.next(), "movie")?);
                let lat = number(args.next(), "lat")?;
                let lng = number(args.next(), "lng")?;
                Ok(Command::Add {
                    id,
                    movie,
                    at: Coordinate::new(lat, lng),
                })
            }
            "remove" => Ok(Command::Remove(LocationId::new(word_arg(args.next(), "location")?))),
            // The query keeps its inner spacing; an empty query is allowed.
            "search" => Ok(Command::Search(rest.to_string())),
            "pick-movie" => Ok(Command::PickMovie(MovieId::new(word_arg(args.next(), "movie")?))),
            "pick-location" => Ok(Command::PickLocation(LocationId::new(word_arg(
                args.next(),
                "location",
            )?))),
            "open" => Ok(Command::Open(LocationId::new(word_arg(args.next(), "location")?))),
            "close" => Ok(Command::Close),
            "city" => Ok(Command::City(CityId::new(word_arg(args.next(), "city")?))),
            "clear" => Ok(Command::Clear),
            "scroll" => Ok(Command::Scroll(number(args.next(), "row")?)),
            "status" => Ok(Command::Status),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn word_arg<'a>(arg: Option<&'a str>, name: &'static str) -> Result<&'a str, CommandError> {
    arg.ok_or(CommandError::MissingArgument(name))
}

fn number<T: std::str::FromStr>(arg: Option<&str>, name: &'static str) -> Result<T, CommandError> {
    let raw = word_arg(arg, name)?;
    raw.parse().map_err(|_| CommandError::InvalidNumber {
        arg: name,
        value: raw.to_string(),
    })
}

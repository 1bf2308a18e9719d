use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Location,
    Neighborhood,
    Events,
    Truck,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Neighborhood => "neighborhood",
            Self::Events => "events",
            Self::Truck => "truck",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single food-truck directory call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("{resource} `{id}` was not found")]
    NotFound { resource: Resource, id: String },
    #[error("{resource} lookup failed: {message}")]
    Transport { resource: Resource, message: String },
}

impl LookupError {
    pub fn not_found(resource: Resource, id: impl Into<String>) -> Self {
        Self::NotFound { resource, id: id.into() }
    }

    pub fn transport(resource: Resource, message: impl Into<String>) -> Self {
        Self::Transport { resource, message: message.into() }
    }

    pub fn resource(&self) -> Resource {
        match self {
            Self::NotFound { resource, .. } | Self::Transport { resource, .. } => *resource,
        }
    }

    /// Not-found and transport failures read the same in chat; the variant
    /// only shows up in logs.
    pub fn user_message(&self) -> &'static str {
        match self.resource() {
            Resource::Location => "Sorry, I'm having trouble getting location details right now.",
            Resource::Neighborhood => {
                "Sorry, I'm having trouble getting neighborhood details right now."
            }
            Resource::Events | Resource::Truck => {
                "Sorry, I'm having trouble getting events right now."
            }
        }
    }
}

/// Problems with what the user typed, answered with guidance instead of data.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("message is empty, nothing to do")]
    EmptyInput,
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),
}

impl CommandError {
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput => {
                "Hi! Mention me with a command, or try `help` to see what I can do.".to_owned()
            }
            Self::MissingArgument("location") => {
                "To find trucks a location is required, e.g. `find trucks at westlake-park in downtown`."
                    .to_owned()
            }
            Self::MissingArgument("locations") => {
                "No locations are configured for events, ask an admin to set `broadcast.location_ids`."
                    .to_owned()
            }
            Self::MissingArgument(other) => format!("Missing `{other}`, try `help`."),
        }
    }
}

use crate::console::Console;
use crate::error::{PostReviewError, UsageError};
use crate::options::ServerOptions;
use crate::settings::{Provider, Settings, resolve_chain};

/// Values resolved once and reused for every request of an invocation.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    credentials: Option<Credentials>,
    repository_id: Option<u64>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"**********")
            .finish()
    }
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Username and password from flags, then config, then the console.
    pub fn credentials(
        &mut self,
        options: &ServerOptions,
        settings: &Settings,
        console: &dyn Console,
    ) -> Result<Credentials, PostReviewError> {
        if let Some(credentials) = &self.credentials {
            return Ok(credentials.clone());
        }

        let username = resolve_chain(chain(
            options.username.as_deref(),
            settings.get("user"),
            Box::new(|| console.prompt("username", None).map(Some)),
        ))?
        .unwrap_or_default();
        let password = resolve_chain(chain(
            options.password.as_deref(),
            settings.get("password"),
            Box::new(|| console.prompt_password("password").map(Some)),
        ))?
        .unwrap_or_default();

        let credentials = Credentials { username, password };
        self.credentials = Some(credentials.clone());
        Ok(credentials)
    }

    pub fn repository_id(&self) -> Option<u64> {
        self.repository_id
    }

    pub fn remember_repository(&mut self, repository_id: u64) {
        self.repository_id = Some(repository_id);
    }
}

fn chain<'a>(
    flag: Option<&'a str>,
    config: Option<&'a str>,
    prompt: Provider<'a, UsageError>,
) -> Vec<Provider<'a, UsageError>> {
    vec![
        Box::new(move || Ok(flag.map(str::to_string))),
        Box::new(move || Ok(config.map(str::to_string))),
        prompt,
    ]
}

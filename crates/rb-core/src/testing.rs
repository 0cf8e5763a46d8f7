use crate::console::Console;
use crate::error::UsageError;
use crate::postreview::ServerConnector;
use crate::settings::Settings;
use rb_client::{ApiVersion, RepositoryInfo, ReviewBoardError, ReviewFields, ReviewServer};
use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub fn repository(id: u64, name: &str, tool: &str, path: &str) -> RepositoryInfo {
    RepositoryInfo {
        id,
        name: name.to_string(),
        tool: tool.to_string(),
        path: path.to_string(),
    }
}

/// Console answering prompts from a script and recording everything shown.
#[derive(Default)]
pub struct ScriptedConsole {
    answers: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
    output: RefCell<Vec<String>>,
    successes: RefCell<Vec<String>>,
    browsed: RefCell<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(ToString::to_string).collect()),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.borrow().clone()
    }

    pub fn browsed(&self) -> Vec<String> {
        self.browsed.borrow().clone()
    }

    fn answer(&self, message: &str) -> Result<String, UsageError> {
        self.prompts.borrow_mut().push(message.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| UsageError::MissingInput {
                prompt: message.to_string(),
            })
    }
}

impl Console for ScriptedConsole {
    fn status(&self, message: &str) {
        self.output.borrow_mut().push(message.to_string());
    }

    fn success(&self, message: &str) {
        self.successes.borrow_mut().push(message.to_string());
    }

    fn prompt(&self, message: &str, default: Option<&str>) -> Result<String, UsageError> {
        let answer = self.answer(message)?;
        match default {
            Some(default) if answer.is_empty() => Ok(default.to_string()),
            _ => Ok(answer),
        }
    }

    fn prompt_password(&self, message: &str) -> Result<String, UsageError> {
        self.answer(message)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, UsageError> {
        let answer = self.answer(message)?;
        Ok(match answer.as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }

    fn launch_browser(&self, url: &str) -> std::io::Result<()> {
        self.browsed.borrow_mut().push(url.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub request_id: u64,
    pub repository_id: Option<u64>,
    pub fields: ReviewFields,
    pub diff: Vec<u8>,
    pub parent_diff: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ServerLog {
    pub connections: Vec<(String, ApiVersion)>,
    pub logins: Vec<(String, String)>,
    pub repository_listings: usize,
    pub uploads: Vec<Upload>,
    pub published: Vec<u64>,
}

/// Review server keeping every call in a shared log.
#[derive(Clone, Default)]
pub struct FakeServer {
    repositories: Vec<RepositoryInfo>,
    reject_login: bool,
    log: Rc<RefCell<ServerLog>>,
    next_id: Rc<Cell<u64>>,
}

impl FakeServer {
    pub fn with_repositories(repositories: Vec<RepositoryInfo>) -> Self {
        Self {
            repositories,
            next_id: Rc::new(Cell::new(100)),
            ..Self::default()
        }
    }

    pub fn rejecting_login(mut self) -> Self {
        self.reject_login = true;
        self
    }

    pub fn log(&self) -> Ref<'_, ServerLog> {
        self.log.borrow()
    }
}

impl ReviewServer for FakeServer {
    fn login(&mut self, username: &str, password: &str) -> rb_client::Result<()> {
        self.log
            .borrow_mut()
            .logins
            .push((username.to_string(), password.to_string()));
        if self.reject_login {
            return Err(ReviewBoardError::Authentication {
                message: "bad credentials".to_string(),
            });
        }
        Ok(())
    }

    fn repositories(&self) -> rb_client::Result<Vec<RepositoryInfo>> {
        self.log.borrow_mut().repository_listings += 1;
        Ok(self.repositories.clone())
    }

    fn create_request(
        &self,
        repository_id: u64,
        fields: &ReviewFields,
        diff: &[u8],
        parent_diff: &[u8],
    ) -> rb_client::Result<u64> {
        let request_id = self.next_id.get();
        self.next_id.set(request_id + 1);
        self.log.borrow_mut().uploads.push(Upload {
            request_id,
            repository_id: Some(repository_id),
            fields: fields.clone(),
            diff: diff.to_vec(),
            parent_diff: parent_diff.to_vec(),
        });
        Ok(request_id)
    }

    fn update_request(
        &self,
        request_id: u64,
        fields: &ReviewFields,
        diff: &[u8],
        parent_diff: &[u8],
    ) -> rb_client::Result<()> {
        self.log.borrow_mut().uploads.push(Upload {
            request_id,
            repository_id: None,
            fields: fields.clone(),
            diff: diff.to_vec(),
            parent_diff: parent_diff.to_vec(),
        });
        Ok(())
    }

    fn publish(&self, request_id: u64) -> rb_client::Result<()> {
        self.log.borrow_mut().published.push(request_id);
        Ok(())
    }
}

/// Hands out clones of one [`FakeServer`], so all sessions share its log.
pub struct FakeConnector {
    pub server: FakeServer,
}

impl ServerConnector for FakeConnector {
    fn connect(
        &self,
        server: &str,
        _settings: &Settings,
        version: ApiVersion,
    ) -> rb_client::Result<Box<dyn ReviewServer>> {
        self.server
            .log
            .borrow_mut()
            .connections
            .push((server.to_string(), version));
        Ok(Box::new(self.server.clone()))
    }
}

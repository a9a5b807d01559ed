//! Scriptable in-memory portal client for unit tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::client::{EnergyCounter, LastData, Plant, PortalClient, PortalError};

/// Which call the fake should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Plants,
    Authentication,
    LastData,
    Logout,
}

#[derive(Default)]
struct FakeState {
    plants: Vec<(Plant, LastData)>,
    failure: Option<Failure>,
    hang: bool,
    plant_calls: usize,
    logouts: usize,
    dates: Vec<NaiveDate>,
}

/// Cloneable handle; clones share state so tests can steer a client that
/// was moved into the integration.
#[derive(Clone, Default)]
pub(crate) struct FakePortal {
    state: Arc<Mutex<FakeState>>,
}

impl FakePortal {
    pub(crate) fn with_plant(self, name: &str, difference: f64, absolute: f64) -> Self {
        self.state.lock().unwrap().plants.push((
            Plant::new(name),
            LastData {
                day: EnergyCounter {
                    difference,
                    absolute,
                },
            },
        ));
        self
    }

    pub(crate) fn set_reading(&self, name: &str, difference: f64, absolute: f64) {
        let mut state = self.state.lock().unwrap();
        if let Some((_, data)) = state.plants.iter_mut().find(|(p, _)| p.name == name) {
            data.day = EnergyCounter {
                difference,
                absolute,
            };
        }
    }

    pub(crate) fn remove_plant(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .plants
            .retain(|(plant, _)| plant.name != name);
    }

    pub(crate) fn fail(&self, failure: Failure) {
        self.state.lock().unwrap().failure = Some(failure);
    }

    pub(crate) fn recover(&self) {
        let mut state = self.state.lock().unwrap();
        state.failure = None;
        state.hang = false;
    }

    pub(crate) fn hang(&self) {
        self.state.lock().unwrap().hang = true;
    }

    pub(crate) fn plant_calls(&self) -> usize {
        self.state.lock().unwrap().plant_calls
    }

    pub(crate) fn logouts(&self) -> usize {
        self.state.lock().unwrap().logouts
    }

    pub(crate) fn dates(&self) -> Vec<NaiveDate> {
        self.state.lock().unwrap().dates.clone()
    }

    fn respond<T: Send>(
        &self,
        result: Result<T, PortalError>,
    ) -> impl Future<Output = Result<T, PortalError>> + Send {
        let hang = self.state.lock().unwrap().hang;
        async move {
            if hang {
                std::future::pending::<()>().await;
            }
            result
        }
    }
}

fn transport(message: &str) -> PortalError {
    PortalError::Transport(Box::new(std::io::Error::other(message.to_string())))
}

impl PortalClient for FakePortal {
    fn plants(&self) -> impl Future<Output = Result<Vec<Plant>, PortalError>> + Send {
        let result = {
            let mut state = self.state.lock().unwrap();
            state.plant_calls += 1;
            match state.failure {
                Some(Failure::Plants) => Err(transport("connection reset")),
                Some(Failure::Authentication) => Err(PortalError::Authentication),
                _ => Ok(state.plants.iter().map(|(plant, _)| plant.clone()).collect()),
            }
        };
        self.respond(result)
    }

    fn last_data_exact(
        &self,
        plant: &Plant,
        date: NaiveDate,
    ) -> impl Future<Output = Result<LastData, PortalError>> + Send {
        let result = {
            let mut state = self.state.lock().unwrap();
            state.dates.push(date);
            if state.failure == Some(Failure::LastData) {
                Err(PortalError::MalformedResponse("missing day node".to_string()))
            } else {
                state
                    .plants
                    .iter()
                    .find(|(known, _)| known.name == plant.name)
                    .map(|(_, data)| *data)
                    .ok_or_else(|| PortalError::MalformedResponse("unknown plant".to_string()))
            }
        };
        self.respond(result)
    }

    fn logout(&self) -> impl Future<Output = Result<(), PortalError>> + Send {
        let result = {
            let mut state = self.state.lock().unwrap();
            if state.failure == Some(Failure::Logout) {
                Err(transport("logout refused"))
            } else {
                state.logouts += 1;
                Ok(())
            }
        };
        self.respond(result)
    }
}

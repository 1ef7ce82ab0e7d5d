#![forbid(unsafe_code)]

//! The story session: scroll events in, bus messages out.
//!
//! A [`StorySession`] owns everything a running story needs: the validated
//! config, the [`StepMapper`], the [`ChartResolver`], the data source and the
//! [`Bus`]. The scroll observer calls [`on_step_enter`], [`on_step_exit`] and
//! [`on_step_progress`]; renderers subscribe to the bus.
//!
//! Failures never stop the story. A chart that fails to resolve is published
//! as an error placeholder, a step without content publishes only its
//! `StepEnter`, and an unusable step mapping leaves the session running with
//! sync disabled.
//!
//! [`on_step_enter`]: StorySession::on_step_enter
//! [`on_step_exit`]: StorySession::on_step_exit
//! [`on_step_progress`]: StorySession::on_step_progress

use scrolly_core::event::{StepEvent, StepProgress};
use tracing::{debug, debug_span, error, info, warn};

use crate::bus::{Bus, Message};
use crate::config::{ConfigError, StepContent, StoryConfig};
use crate::resolve::{ChartResolver, ChartUpdate, DataSource};
use crate::step_mapper::StepMapper;

/// A running story.
pub struct StorySession<D> {
    config: StoryConfig,
    mapper: StepMapper,
    resolver: ChartResolver,
    data: D,
    bus: Bus,
    active: Option<usize>,
}

impl<D: DataSource> StorySession<D> {
    /// Start a session, logging any config problems and carrying on.
    pub fn new(config: StoryConfig, data: D) -> Self {
        if let Err(errors) = config.validate() {
            for err in &errors {
                error!(%err, "story config problem");
            }
        }
        Self::build(config, data)
    }

    /// Start a session only if the config validates.
    pub fn validated(config: StoryConfig, data: D) -> Result<Self, Vec<ConfigError>> {
        config.validate()?;
        Ok(Self::build(config, data))
    }

    fn build(config: StoryConfig, data: D) -> Self {
        let mapper = StepMapper::from_config(&config);
        let resolver = ChartResolver::from_config(&config);
        info!(
            steps = mapper.len(),
            profile = mapper.profile().unwrap_or("<none>"),
            "story session started"
        );
        Self {
            config,
            mapper,
            resolver,
            data,
            bus: Bus::new(),
            active: None,
        }
    }

    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    pub fn mapper(&self) -> &StepMapper {
        &self.mapper
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Index of the step last entered.
    pub fn active_step(&self) -> Option<usize> {
        self.active
    }

    /// Switch dataset profile; the step mapping is recomputed on next use.
    pub fn set_profile(&mut self, profile: impl Into<String>) {
        let profile = profile.into();
        if !self.config.profiles.contains_key(&profile) {
            warn!(profile = %profile, "switching to a profile with no configured counts");
        }
        self.config.active_profile = Some(profile.clone());
        self.mapper.set_profile(profile);
        self.active = None;
    }

    /// Content configured for the step at `index`.
    ///
    /// Looks up the element's own name first, then the mapper's canonical
    /// name, then the dynamic group owning the index.
    pub fn content_for(&self, index: usize, name: Option<&str>) -> Option<&StepContent> {
        if let Some(step) = name.and_then(|n| self.config.step(n)) {
            return Some(step);
        }
        let mapping = self.mapper.calculate_all_mappings();
        if let Some(step) = mapping.name_of(index).and_then(|n| self.config.step(n)) {
            return Some(step);
        }
        self.mapper
            .group_containing(index)
            .and_then(|(group, _)| self.config.step(group))
    }

    fn step_name(&self, event: &StepEvent) -> Option<String> {
        event.name.clone().or_else(|| {
            self.mapper
                .calculate_all_mappings()
                .name_of(event.index)
                .map(str::to_owned)
        })
    }

    /// A step crossed the trigger line. Returns the number of deliveries.
    pub fn on_step_enter(&mut self, event: &StepEvent) -> usize {
        let _span = debug_span!("step_enter", index = event.index, direction = %event.direction).entered();
        self.active = Some(event.index);

        let step_name = self.step_name(event);
        let mut delivered = self.bus.publish(Message::StepEnter {
            index: event.index,
            direction: event.direction,
            step_name: step_name.clone(),
        });

        let Some(content) = self.content_for(event.index, step_name.as_deref()).cloned() else {
            debug!(name = ?step_name, "no content for step");
            return delivered;
        };
        let next_chart = self
            .content_for(event.index + 1, None)
            .and_then(|s| s.chart.clone());

        if let Some(chart) = &content.chart {
            let update = match self
                .resolver
                .resolve(chart, next_chart.as_ref(), event.direction, &self.data)
            {
                Ok(update) => update,
                Err(err) => {
                    error!(%err, step = %content.id, "chart failed to resolve");
                    ChartUpdate::error_state(chart, event.direction, &err)
                }
            };
            delivered += self.bus.publish(Message::Chart(update));
        }
        if let Some(map) = content.map {
            delivered += self.bus.publish(Message::Map(map));
        }
        if let Some(image) = content.image {
            delivered += self.bus.publish(Message::Image(image));
        }
        delivered
    }

    /// A step left the trigger line.
    pub fn on_step_exit(&mut self, event: &StepEvent) -> usize {
        if self.active == Some(event.index) {
            self.active = None;
        }
        self.bus.publish(Message::StepExit {
            index: event.index,
            direction: event.direction,
        })
    }

    /// Progress through the active step. Only cities-timeline maps care.
    pub fn on_step_progress(&mut self, progress: &StepProgress) -> usize {
        let step = &progress.step;
        let map = self
            .content_for(step.index, step.name.as_deref())
            .and_then(|c| c.map.as_ref())
            .filter(|m| m.is_cities_timeline())
            .cloned();
        match map {
            Some(map) => self.bus.publish(Message::MapProgress {
                progress: progress.progress,
                direction: step.direction,
                map,
            }),
            None => 0,
        }
    }
}

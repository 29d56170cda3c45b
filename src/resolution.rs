//! Role-to-monitor resolution
//!
//! Pure mapping from a monitor topology and the main/canvas preference pair
//! to one monitor per role, plus the preference corrections that make the
//! same outcome come back on the next run without re-deriving it.
//!
//! Precedence:
//! 1. Both roles asking for the primary: canvas loses `show_on_primary`.
//! 2. A role asking for the primary gets it; the other role takes its pinned
//!    non-primary monitor, else the best non-primary (pinned from then on),
//!    else the primary.
//! 3. Neither asking: each role looks up its pin across all monitors. An
//!    unresolved main takes the primary, an unresolved canvas takes the best
//!    non-primary (pinned), else the primary.
//! 4. Any role on the primary has its pin cleared.

use serde::Serialize;
use std::mem;
use tracing::{debug, warn};

use crate::config::RolePreferences;
use crate::error::ConfigError;
use crate::types::{MonitorDescriptor, Role};

/// A preference mutation made during resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    /// Both roles asked for the primary; canvas gave it up
    PrimaryConflict,
    /// Pin missing or stale; the role was pinned to the best non-primary
    FallbackPinned {
        role: Role,
        device_name: String,
        previous: String,
    },
    /// The role landed on the primary and now requests it explicitly
    PromotedToPrimary { role: Role },
    /// The role sits on the primary so its pin was dropped
    PinCleared { role: Role, previous: String },
    /// No monitor was reported as primary; this one was promoted
    PrimarySynthesized { device_name: String },
    /// A second monitor reported as primary lost the flag
    DuplicatePrimaryDemoted { device_name: String },
}

impl Correction {
    /// Whether this changed a stored preference rather than the topology snapshot
    pub fn touches_preferences(&self) -> bool {
        !matches!(
            self,
            Correction::PrimarySynthesized { .. } | Correction::DuplicatePrimaryDemoted { .. }
        )
    }
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub main: MonitorDescriptor,
    pub canvas: MonitorDescriptor,
    /// Preferences to persist
    pub preferences: RolePreferences,
    pub corrections: Vec<Correction>,
}

impl Resolution {
    pub fn monitor(&self, role: Role) -> &MonitorDescriptor {
        match role {
            Role::Main => &self.main,
            Role::Canvas => &self.canvas,
        }
    }
}

/// Resolve both roles against `topology`.
///
/// Fails only when the topology is empty.
pub fn resolve(
    mut topology: Vec<MonitorDescriptor>,
    preferences: RolePreferences,
) -> Result<Resolution, ConfigError> {
    if topology.is_empty() {
        return Err(ConfigError::NoDisplaysFound);
    }

    let mut corrections = Vec::new();
    let primary = normalize_primary(&mut topology, &mut corrections);
    let best = best_non_primary(&topology);

    let mut resolver = Resolver {
        topology: &topology,
        primary,
        best,
        preferences,
        corrections,
    };
    let (main, canvas) = resolver.assign();
    resolver.clear_primary_pins(main, canvas);

    debug!(
        main = %topology[main].device_name,
        canvas = %topology[canvas].device_name,
        corrections = resolver.corrections.len(),
        "Resolved display roles"
    );

    let Resolver {
        preferences,
        corrections,
        ..
    } = resolver;

    Ok(Resolution {
        main: topology[main].clone(),
        canvas: topology[canvas].clone(),
        preferences,
        corrections,
    })
}

/// Leave exactly one primary and return its index. Expects a non-empty topology.
fn normalize_primary(
    topology: &mut [MonitorDescriptor],
    corrections: &mut Vec<Correction>,
) -> usize {
    match topology.iter().position(|monitor| monitor.is_primary) {
        Some(primary) => {
            for monitor in topology[primary + 1..].iter_mut().filter(|m| m.is_primary) {
                warn!(name = %monitor.device_name, "More than one primary monitor reported, demoting");
                monitor.is_primary = false;
                corrections.push(Correction::DuplicatePrimaryDemoted {
                    device_name: monitor.device_name.clone(),
                });
            }
            primary
        }
        None => {
            warn!(name = %topology[0].device_name, "No primary monitor reported, using the first one");
            topology[0].is_primary = true;
            corrections.push(Correction::PrimarySynthesized {
                device_name: topology[0].device_name.clone(),
            });
            0
        }
    }
}

/// Largest non-primary monitor by bounds area. On equal area the later one wins.
fn best_non_primary(topology: &[MonitorDescriptor]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (index, monitor) in topology.iter().enumerate() {
        if monitor.is_primary {
            continue;
        }
        let area = monitor.bounds.area();
        if best.is_none_or(|(_, best_area)| area >= best_area) {
            best = Some((index, area));
        }
    }
    best.map(|(index, _)| index)
}

struct Resolver<'a> {
    topology: &'a [MonitorDescriptor],
    primary: usize,
    best: Option<usize>,
    preferences: RolePreferences,
    corrections: Vec<Correction>,
}

impl Resolver<'_> {
    fn assign(&mut self) -> (usize, usize) {
        if self.preferences.main.show_on_primary && self.preferences.canvas.show_on_primary {
            self.preferences.canvas.show_on_primary = false;
            self.corrections.push(Correction::PrimaryConflict);
        }

        let on_primary = if self.preferences.main.show_on_primary {
            Some(Role::Main)
        } else if self.preferences.canvas.show_on_primary {
            Some(Role::Canvas)
        } else {
            None
        };

        match on_primary {
            Some(role) => {
                let other = self.pick_secondary(role.other());
                match role {
                    Role::Main => (self.primary, other),
                    Role::Canvas => (other, self.primary),
                }
            }
            None => self.pick_independent(),
        }
    }

    /// Index of the monitor named `name`, optionally skipping the primary
    fn find_by_name(&self, name: &str, include_primary: bool) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.topology
            .iter()
            .enumerate()
            .find(|(index, monitor)| {
                (include_primary || *index != self.primary) && monitor.device_name == name
            })
            .map(|(index, _)| index)
    }

    /// Monitor for the role that is not on the primary
    fn pick_secondary(&mut self, role: Role) -> usize {
        let pinned = self.find_by_name(&self.preferences.get(role).monitor_name, false);
        match pinned {
            Some(index) => index,
            None => self.fall_back_to_best(role),
        }
    }

    fn pick_independent(&mut self) -> (usize, usize) {
        let main_pin = self.find_by_name(&self.preferences.main.monitor_name, true);
        let main = match main_pin {
            Some(index) => index,
            None => {
                self.promote(Role::Main);
                self.primary
            }
        };

        let canvas_pin = self.find_by_name(&self.preferences.canvas.monitor_name, true);
        let mut canvas = match canvas_pin {
            Some(index) => index,
            None => self.fall_back_to_best(Role::Canvas),
        };

        // Never both on the primary while another monitor is available
        if main == self.primary && canvas == self.primary && self.best.is_some() {
            canvas = self.fall_back_to_best(Role::Canvas);
        }

        // Something on the primary must carry show_on_primary for the next run
        if !self.preferences.main.show_on_primary && !self.preferences.canvas.show_on_primary {
            if main == self.primary {
                self.promote(Role::Main);
            } else if canvas == self.primary {
                self.promote(Role::Canvas);
            }
        }

        (main, canvas)
    }

    /// Best non-primary (pinned), or the primary when there is none
    fn fall_back_to_best(&mut self, role: Role) -> usize {
        match self.best {
            Some(best) => {
                self.pin(role, best);
                best
            }
            None => self.primary,
        }
    }

    fn pin(&mut self, role: Role, index: usize) {
        let topology = self.topology;
        let device_name = &topology[index].device_name;
        let preference = self.preferences.get_mut(role);
        if preference.monitor_name != *device_name {
            let previous = mem::replace(&mut preference.monitor_name, device_name.clone());
            self.corrections.push(Correction::FallbackPinned {
                role,
                device_name: device_name.clone(),
                previous,
            });
        }
    }

    fn promote(&mut self, role: Role) {
        self.preferences.get_mut(role).show_on_primary = true;
        self.corrections.push(Correction::PromotedToPrimary { role });
    }

    fn clear_primary_pins(&mut self, main: usize, canvas: usize) {
        for (role, index) in [(Role::Main, main), (Role::Canvas, canvas)] {
            if index != self.primary {
                continue;
            }
            let preference = self.preferences.get_mut(role);
            if preference.has_pin() {
                let previous = mem::take(&mut preference.monitor_name);
                self.corrections.push(Correction::PinCleared { role, previous });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RolePreference;
    use crate::types::{MonitorId, Rect};

    fn monitor(name: &str, x: i32, width: u32, height: u32, is_primary: bool) -> MonitorDescriptor {
        let bounds = Rect::new(x, 0, width, height);
        MonitorDescriptor {
            id: MonitorId(x as u32),
            bounds,
            work: bounds,
            is_primary,
            device_name: name.to_string(),
        }
    }

    fn prefs(main: RolePreference, canvas: RolePreference) -> RolePreferences {
        RolePreferences { main, canvas }
    }

    fn on_primary() -> RolePreference {
        RolePreference {
            show_on_primary: true,
            ..RolePreference::default()
        }
    }

    fn pinned(name: &str) -> RolePreference {
        RolePreference {
            monitor_name: name.to_string(),
            ..RolePreference::default()
        }
    }

    /// Primary P (100x100) at 0, S (200x200) at 100
    fn two_monitors() -> Vec<MonitorDescriptor> {
        vec![
            monitor("P", 0, 100, 100, true),
            monitor("S", 100, 200, 200, false),
        ]
    }

    #[test]
    fn test_empty_topology_is_no_displays_found() {
        let result = resolve(Vec::new(), RolePreferences::default());
        assert!(matches!(result, Err(ConfigError::NoDisplaysFound)));
    }

    #[test]
    fn test_main_on_primary_canvas_takes_larger_secondary() {
        let resolution = resolve(
            two_monitors(),
            prefs(on_primary(), RolePreference::default_for(Role::Canvas)),
        )
        .unwrap();

        assert_eq!(resolution.main.device_name, "P");
        assert_eq!(resolution.main.bounds.area(), 100 * 100);
        assert_eq!(resolution.canvas.device_name, "S");
        assert_eq!(resolution.canvas.bounds.area(), 200 * 200);
        assert_eq!(resolution.preferences.canvas.monitor_name, "S");
        assert!(resolution.preferences.canvas.show_fullscreen);
        assert_eq!(
            resolution.corrections,
            vec![Correction::FallbackPinned {
                role: Role::Canvas,
                device_name: "S".to_string(),
                previous: String::new(),
            }]
        );
    }

    #[test]
    fn test_both_on_primary_downgrades_canvas() {
        let resolution = resolve(two_monitors(), prefs(on_primary(), on_primary())).unwrap();

        assert!(resolution.preferences.main.show_on_primary);
        assert!(!resolution.preferences.canvas.show_on_primary);
        assert_eq!(resolution.main.device_name, "P");
        assert_eq!(resolution.canvas.device_name, "S");
        assert_eq!(resolution.corrections[0], Correction::PrimaryConflict);
    }

    #[test]
    fn test_canvas_on_primary_main_takes_its_pin() {
        let monitors = vec![
            monitor("P", 0, 100, 100, true),
            monitor("A", 100, 300, 300, false),
            monitor("B", 400, 200, 200, false),
        ];
        let resolution = resolve(monitors, prefs(pinned("B"), on_primary())).unwrap();

        assert_eq!(resolution.canvas.device_name, "P");
        assert_eq!(resolution.main.device_name, "B");
        assert_eq!(resolution.preferences.main.monitor_name, "B");
        assert!(resolution.corrections.is_empty());
    }

    #[test]
    fn test_pin_to_primary_ignored_when_other_role_owns_primary() {
        let resolution = resolve(two_monitors(), prefs(on_primary(), pinned("P"))).unwrap();

        assert_eq!(resolution.canvas.device_name, "S");
        assert_eq!(resolution.preferences.canvas.monitor_name, "S");
    }

    #[test]
    fn test_stale_pin_falls_back_to_best_and_is_overwritten() {
        let resolution = resolve(two_monitors(), prefs(on_primary(), pinned("GONE"))).unwrap();

        assert_eq!(resolution.canvas.device_name, "S");
        assert_eq!(resolution.preferences.canvas.monitor_name, "S");
        assert_eq!(
            resolution.corrections,
            vec![Correction::FallbackPinned {
                role: Role::Canvas,
                device_name: "S".to_string(),
                previous: "GONE".to_string(),
            }]
        );
    }

    #[test]
    fn test_stale_pin_without_secondary_lands_on_primary_and_is_cleared() {
        let monitors = vec![monitor("P", 0, 100, 100, true)];
        let resolution = resolve(monitors, prefs(on_primary(), pinned("GONE"))).unwrap();

        assert_eq!(resolution.canvas.device_name, "P");
        assert!(resolution.preferences.canvas.monitor_name.is_empty());
        assert_eq!(
            resolution.corrections,
            vec![Correction::PinCleared {
                role: Role::Canvas,
                previous: "GONE".to_string(),
            }]
        );
    }

    #[test]
    fn test_single_monitor_both_roles_share_it_with_empty_pins() {
        let monitors = vec![monitor("ONLY", 0, 1920, 1080, true)];
        let resolution = resolve(monitors, prefs(pinned("OLD-1"), pinned("OLD-2"))).unwrap();

        assert_eq!(resolution.main.device_name, "ONLY");
        assert_eq!(resolution.canvas.device_name, "ONLY");
        assert!(resolution.preferences.main.monitor_name.is_empty());
        assert!(resolution.preferences.canvas.monitor_name.is_empty());
        assert!(resolution.preferences.main.show_on_primary);
        assert!(!resolution.preferences.canvas.show_on_primary);
    }

    #[test]
    fn test_neither_on_primary_defaults_main_to_primary() {
        let resolution = resolve(two_monitors(), RolePreferences::default()).unwrap();

        assert_eq!(resolution.main.device_name, "P");
        assert!(resolution.preferences.main.show_on_primary);
        assert_eq!(resolution.canvas.device_name, "S");
        assert_eq!(resolution.preferences.canvas.monitor_name, "S");
    }

    #[test]
    fn test_neither_on_primary_pins_may_name_the_primary() {
        // Main pinned to a secondary, canvas pinned to the primary by name
        let resolution = resolve(two_monitors(), prefs(pinned("S"), pinned("P"))).unwrap();

        assert_eq!(resolution.main.device_name, "S");
        assert_eq!(resolution.canvas.device_name, "P");
        assert!(resolution.preferences.canvas.show_on_primary);
        assert!(resolution.preferences.canvas.monitor_name.is_empty());
        assert_eq!(resolution.preferences.main.monitor_name, "S");
    }

    #[test]
    fn test_neither_on_primary_both_pinned_to_primary_splits_them() {
        let resolution = resolve(two_monitors(), prefs(pinned("P"), pinned("P"))).unwrap();

        assert_eq!(resolution.main.device_name, "P");
        assert_eq!(resolution.canvas.device_name, "S");
        assert!(resolution.preferences.main.show_on_primary);
        assert!(resolution.preferences.main.monitor_name.is_empty());
        assert_eq!(resolution.preferences.canvas.monitor_name, "S");
    }

    #[test]
    fn test_equal_area_tie_goes_to_last_enumerated() {
        let monitors = vec![
            monitor("P", 0, 100, 100, true),
            monitor("A", 100, 200, 200, false),
            monitor("B", 300, 200, 200, false),
        ];
        let resolution = resolve(monitors.clone(), RolePreferences::default()).unwrap();
        assert_eq!(resolution.canvas.device_name, "B");

        let again = resolve(monitors, RolePreferences::default()).unwrap();
        assert_eq!(again, resolution);
    }

    #[test]
    fn test_missing_primary_flag_promotes_first_monitor() {
        let monitors = vec![
            monitor("A", 0, 100, 100, false),
            monitor("B", 100, 50, 50, false),
        ];
        let resolution = resolve(monitors, RolePreferences::default()).unwrap();

        assert_eq!(resolution.main.device_name, "A");
        assert!(resolution.main.is_primary);
        assert_eq!(resolution.canvas.device_name, "B");
        assert_eq!(
            resolution.corrections[0],
            Correction::PrimarySynthesized { device_name: "A".to_string() }
        );
        assert!(!resolution.corrections[0].touches_preferences());
    }

    #[test]
    fn test_duplicate_primary_flags_keep_the_first() {
        let monitors = vec![
            monitor("A", 0, 100, 100, true),
            monitor("B", 100, 400, 400, true),
        ];
        let resolution = resolve(monitors, RolePreferences::default()).unwrap();

        assert_eq!(resolution.main.device_name, "A");
        assert_eq!(resolution.canvas.device_name, "B");
        assert!(!resolution.canvas.is_primary);
        assert_eq!(
            resolution.corrections[0],
            Correction::DuplicatePrimaryDemoted { device_name: "B".to_string() }
        );
        assert!(resolution.corrections[1..].iter().all(Correction::touches_preferences));
    }

    #[test]
    fn test_display_flags_are_left_untouched() {
        let main = RolePreference {
            show_maximized: true,
            ..on_primary()
        };
        let canvas = RolePreference {
            show_fullscreen: false,
            show_maximized: true,
            ..RolePreference::default()
        };
        let resolution = resolve(two_monitors(), prefs(main, canvas)).unwrap();

        assert!(resolution.preferences.main.show_maximized);
        assert!(resolution.preferences.canvas.show_maximized);
        assert!(!resolution.preferences.canvas.show_fullscreen);
    }

    /// Every combination of flags and pins over a few topologies
    fn all_preference_pairs(names: &[&str]) -> Vec<RolePreferences> {
        let mut pins: Vec<String> = vec![String::new(), "GONE".to_string()];
        pins.extend(names.iter().map(|name| name.to_string()));

        let mut singles = Vec::new();
        for show_on_primary in [false, true] {
            for pin in &pins {
                singles.push(RolePreference {
                    show_on_primary,
                    monitor_name: pin.clone(),
                    ..RolePreference::default()
                });
            }
        }

        let mut pairs = Vec::new();
        for main in &singles {
            for canvas in &singles {
                pairs.push(prefs(main.clone(), canvas.clone()));
            }
        }
        pairs
    }

    fn sample_topologies() -> Vec<Vec<MonitorDescriptor>> {
        vec![
            vec![monitor("P", 0, 1920, 1080, true)],
            two_monitors(),
            vec![
                monitor("A", 0, 200, 200, false),
                monitor("P", 200, 100, 100, true),
                monitor("B", 300, 200, 200, false),
            ],
            vec![
                monitor("X", 0, 100, 100, false),
                monitor("Y", 100, 300, 100, false),
            ],
        ]
    }

    #[test]
    fn test_resolution_is_total_and_reaches_a_fixed_point() {
        for topology in sample_topologies() {
            let names: Vec<&str> = topology.iter().map(|m| m.device_name.as_str()).collect();
            for input in all_preference_pairs(&names) {
                let first = resolve(topology.clone(), input.clone()).unwrap();
                assert!(names.contains(&first.main.device_name.as_str()));
                assert!(names.contains(&first.canvas.device_name.as_str()));

                let second = resolve(topology.clone(), first.preferences.clone()).unwrap();
                assert_eq!(second.main, first.main, "main moved for {input:?}");
                assert_eq!(second.canvas, first.canvas, "canvas moved for {input:?}");
                assert_eq!(second.preferences, first.preferences, "prefs changed for {input:?}");
                assert!(
                    !second.corrections.iter().any(Correction::touches_preferences),
                    "corrections on rerun for {input:?}"
                );
            }
        }
    }

    #[test]
    fn test_invariants_hold_for_every_input() {
        for topology in sample_topologies() {
            let names: Vec<&str> = topology.iter().map(|m| m.device_name.as_str()).collect();
            for input in all_preference_pairs(&names) {
                let resolution = resolve(topology.clone(), input.clone()).unwrap();
                let out = &resolution.preferences;

                assert!(!(out.main.show_on_primary && out.canvas.show_on_primary));
                if input.main.show_on_primary && input.canvas.show_on_primary {
                    assert!(!out.canvas.show_on_primary);
                }
                for role in Role::ALL {
                    if resolution.monitor(role).is_primary {
                        assert!(out.get(role).monitor_name.is_empty(), "{role} kept a pin on primary");
                    }
                }
                if topology.len() == 1 {
                    assert_eq!(resolution.main, resolution.canvas);
                }
            }
        }
    }
}

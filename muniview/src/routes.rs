use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use scene::Color;

/// Assigns each route tag a pseudo-random display color. Seeding the RNG from
/// the tag keeps the assignment stable across polls and restarts, so markers
/// and the legend never reshuffle.
pub struct RoutePalette {
    assigned: HashMap<String, Color>,
}

impl RoutePalette {
    pub fn new() -> RoutePalette {
        RoutePalette {
            assigned: HashMap::new(),
        }
    }

    pub fn color(&mut self, tag: &str) -> Color {
        if let Some(color) = self.assigned.get(tag) {
            return *color;
        }
        let mut hasher = DefaultHasher::new();
        tag.hash(&mut hasher);
        let mut rng = XorShiftRng::seed_from_u64(hasher.finish());
        let c = colorous::SINEBOW.eval_continuous(rng.gen_range(0.0..1.0));
        let color = Color::rgb(c.r as usize, c.g as usize, c.b as usize);
        self.assigned.insert(tag.to_string(), color);
        color
    }
}

/// Which routes exist and what to call them. Titles come from the route list
/// feed; tags come from the vehicles actually seen in polls. Only observed
/// tags show up in the filter options and the legend.
pub struct RouteRegistry {
    titles: BTreeMap<String, String>,
    observed: BTreeSet<String>,
    palette: RoutePalette,
}

impl RouteRegistry {
    pub fn new() -> RouteRegistry {
        RouteRegistry {
            titles: BTreeMap::new(),
            observed: BTreeSet::new(),
            palette: RoutePalette::new(),
        }
    }

    /// Records route tags seen in a poll. Returns true if any were new.
    pub fn observe<I: IntoIterator<Item = String>>(&mut self, tags: I) -> bool {
        let mut any_new = false;
        for tag in tags {
            any_new |= self.observed.insert(tag);
        }
        any_new
    }

    pub fn set_titles(&mut self, pairs: Vec<(String, String)>) {
        for (tag, title) in pairs {
            self.titles.insert(tag, title);
        }
    }

    /// The route's title, or the bare tag when the route list hasn't supplied
    /// one (or never will).
    pub fn display_name<'a>(&'a self, tag: &'a str) -> &'a str {
        match self.titles.get(tag) {
            Some(title) => title,
            None => tag,
        }
    }

    pub fn color(&mut self, tag: &str) -> Color {
        self.palette.color(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Everything selectable in the filter control: "all", then the observed
    /// tags in order.
    pub fn options(&self) -> Vec<(Option<String>, String)> {
        let mut options = vec![(None, "all".to_string())];
        for tag in &self.observed {
            options.push((Some(tag.clone()), self.display_name(tag).to_string()));
        }
        options
    }

    pub fn legend(&mut self) -> Vec<(String, Color)> {
        let tags: Vec<String> = self.observed.iter().cloned().collect();
        tags.into_iter()
            .map(|tag| {
                let label = match self.titles.get(&tag) {
                    Some(title) => title.clone(),
                    None => tag.clone(),
                };
                let color = self.palette.color(&tag);
                (label, color)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_stable_across_runs() {
        let mut a = RoutePalette::new();
        let mut b = RoutePalette::new();
        assert_eq!(a.color("N"), b.color("N"));
        assert_eq!(a.color("N"), a.color("N"));
        // Not guaranteed distinct in general, but these two better be.
        assert_ne!(a.color("N"), a.color("5"));
    }

    #[test]
    fn observing_reports_only_new_tags() {
        let mut registry = RouteRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.observe(vec!["N".to_string(), "5".to_string()]));
        assert!(!registry.observe(vec!["5".to_string()]));
        assert!(registry.observe(vec!["5".to_string(), "J".to_string()]));
        assert!(!registry.is_empty());
    }

    #[test]
    fn unknown_titles_fall_back_to_the_tag() {
        let mut registry = RouteRegistry::new();
        registry.observe(vec!["5".to_string(), "J".to_string()]);
        registry.set_titles(vec![("J".to_string(), "J-Church".to_string())]);

        assert_eq!(registry.display_name("J"), "J-Church");
        assert_eq!(registry.display_name("5"), "5");

        let legend = registry.legend();
        assert_eq!(legend[0].0, "5");
        assert_eq!(legend[1].0, "J-Church");
    }

    #[test]
    fn options_start_with_all() {
        let mut registry = RouteRegistry::new();
        registry.observe(vec!["N".to_string(), "5".to_string()]);
        let options = registry.options();
        assert_eq!(options[0], (None, "all".to_string()));
        assert_eq!(options[1].0.as_deref(), Some("5"));
        assert_eq!(options[2].0.as_deref(), Some("N"));
    }
}

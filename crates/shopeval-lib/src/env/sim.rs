//! Deterministic simulated web shop.
//!
//! A small text environment honoring the `search[keywords]` / `click[token]`
//! action grammar. It exists so the orchestrator can be exercised end to end
//! without the real benchmark environment; the catalog and goals are
//! generated from a seedable RNG for reproducible runs.

use super::{EnvConfig, ResetOutcome, ShopEnv, StepOutcome};
use crate::error::EvalError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

const COLORS: &[&str] = &[
    "red", "blue", "green", "black", "white", "grey", "yellow", "purple", "orange", "brown",
];
const MATERIALS: &[&str] = &[
    "cotton", "leather", "wool", "denim", "silk", "linen", "canvas", "suede",
];
const ITEMS: &[&str] = &[
    "shirt", "jacket", "sneakers", "backpack", "wallet", "scarf", "hat", "belt", "dress", "boots",
];

const RESULTS_PER_PAGE: usize = 10;

#[derive(Debug, Clone)]
struct Product {
    asin: String,
    title: String,
    price_cents: u64,
}

#[derive(Debug, Clone, PartialEq)]
enum Page {
    Search,
    Results(Vec<usize>),
    Item(usize),
}

/// In-process shop honoring the reset/step contract.
pub struct SimShopEnv {
    products: Vec<Product>,
    goal: usize,
    human_goals: bool,
    page: Page,
}

impl SimShopEnv {
    pub fn new(config: &EnvConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let count = config.num_products.max(1);
        let products = (0..count)
            .map(|i| {
                let color = COLORS[rng.gen_range(0..COLORS.len())];
                let material = MATERIALS[rng.gen_range(0..MATERIALS.len())];
                let item = ITEMS[rng.gen_range(0..ITEMS.len())];
                Product {
                    asin: format!("B{i:08}"),
                    title: format!("{color} {material} {item}"),
                    price_cents: rng.gen_range(500..20_000),
                }
            })
            .collect::<Vec<_>>();
        let goal = rng.gen_range(0..count);

        Self {
            products,
            goal,
            human_goals: config.human_goals,
            page: Page::Search,
        }
    }

    fn instruction(&self) -> String {
        let title = &self.products[self.goal].title;
        if self.human_goals {
            format!("I'm looking for a {title}; please find it and buy it for me.")
        } else {
            format!("Buy a {title}.")
        }
    }

    fn search_page(&self) -> String {
        "WebShop [SEP] Search [SEP] Enter a query with search[keywords]".to_string()
    }

    fn results_page(&self, hits: &[usize]) -> String {
        let mut lines = vec!["WebShop [SEP] Search Results".to_string()];
        for &i in hits {
            let p = &self.products[i];
            lines.push(format!(
                "{} [SEP] {} [SEP] ${:.2}",
                p.asin,
                p.title,
                p.price_cents as f64 / 100.0
            ));
        }
        lines.push("click[<asin>] to open an item, click[back to search] to start over".to_string());
        lines.join("\n")
    }

    fn item_page(&self, index: usize) -> String {
        let p = &self.products[index];
        format!(
            "WebShop [SEP] {} [SEP] {} [SEP] ${:.2}\nclick[buy now] to purchase, click[back to search] to start over",
            p.asin,
            p.title,
            p.price_cents as f64 / 100.0
        )
    }

    fn search(&mut self, keywords: &str) -> StepOutcome {
        let needles = keywords
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let hits = self
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| needles.iter().all(|n| p.title.contains(n.as_str())))
            .map(|(i, _)| i)
            .take(RESULTS_PER_PAGE)
            .collect::<Vec<_>>();
        let observation = self.results_page(&hits);
        self.page = Page::Results(hits.clone());
        StepOutcome {
            observation,
            reward: 0.0,
            done: false,
            info: json!({ "hits": hits.len() }),
        }
    }

    fn click(&mut self, token: &str) -> Result<StepOutcome, EvalError> {
        let token_lower = token.to_lowercase();
        let page = self.page.clone();
        match (&page, token_lower.as_str()) {
            (_, "back to search") => {
                self.page = Page::Search;
                Ok(StepOutcome {
                    observation: self.search_page(),
                    reward: 0.0,
                    done: false,
                    info: json!({}),
                })
            }
            (Page::Item(index), "buy now") => {
                let bought = *index;
                let reward = if bought == self.goal { 1.0 } else { 0.0 };
                Ok(StepOutcome {
                    observation: format!("Thank you for your purchase of {}", self.products[bought].asin),
                    reward,
                    done: true,
                    info: json!({ "asin": self.products[bought].asin }),
                })
            }
            (Page::Results(hits), _) => {
                let wanted = token.to_uppercase();
                let found = hits
                    .iter()
                    .copied()
                    .find(|&i| self.products[i].asin == wanted);
                match found {
                    Some(index) => {
                        self.page = Page::Item(index);
                        Ok(StepOutcome {
                            observation: self.item_page(index),
                            reward: 0.0,
                            done: false,
                            info: json!({}),
                        })
                    }
                    None => Err(EvalError::EnvironmentRejected {
                        action: format!("click[{token}]"),
                        reason: "no such item in the current results".to_string(),
                    }),
                }
            }
            _ => Err(EvalError::EnvironmentRejected {
                action: format!("click[{token}]"),
                reason: "nothing clickable by that name on this page".to_string(),
            }),
        }
    }
}

#[cfg(test)]
impl SimShopEnv {
    fn goal_asin(&self) -> &str {
        &self.products[self.goal].asin
    }
}

impl ShopEnv for SimShopEnv {
    fn reset(&mut self) -> Result<ResetOutcome, EvalError> {
        self.page = Page::Search;
        Ok(ResetOutcome {
            observation: self.search_page(),
            instruction: self.instruction(),
        })
    }

    fn step(&mut self, action: &str) -> Result<StepOutcome, EvalError> {
        let action = action.trim();
        if let Some(keywords) = action
            .strip_prefix("search[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Ok(self.search(keywords));
        }
        if let Some(token) = action
            .strip_prefix("click[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return self.click(token);
        }
        Err(EvalError::EnvironmentRejected {
            action: action.to_string(),
            reason: "expected search[keywords] or click[token]".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_env() -> SimShopEnv {
        SimShopEnv::new(&EnvConfig {
            num_products: 50,
            human_goals: false,
            seed: Some(7),
        })
    }

    #[test]
    fn reset_returns_instruction_and_search_page() {
        let mut env = seeded_env();
        let outcome = env.reset().unwrap();
        assert!(outcome.observation.contains("Search"));
        assert!(outcome.instruction.starts_with("Buy a "));
    }

    #[test]
    fn goal_purchase_yields_exact_reward_one() {
        let mut env = seeded_env();
        let reset = env.reset().unwrap();
        // The plain goal template is "Buy a <title>."
        let title = reset
            .instruction
            .trim_start_matches("Buy a ")
            .trim_end_matches('.')
            .to_string();
        let goal_asin = env.goal_asin().to_string();

        let results = env.step(&format!("search[{title}]")).unwrap();
        assert!(!results.done);
        assert!(results.observation.contains(&goal_asin));

        let item = env.step(&format!("click[{goal_asin}]")).unwrap();
        assert!(item.observation.contains("buy now"));

        let last = env.step("click[buy now]").unwrap();
        assert!(last.done);
        assert_eq!(last.reward, 1.0);
    }

    #[test]
    fn wrong_purchase_yields_zero_reward() {
        let mut env = seeded_env();
        env.reset().unwrap();
        let goal_asin = env.goal_asin().to_string();

        // Some non-goal product always exists; scan category searches for one
        // and stop on the results page that lists it.
        let mut other = None;
        'scan: for item in ITEMS {
            let results = env.step(&format!("search[{item}]")).unwrap();
            for line in results.observation.lines().filter(|l| l.starts_with('B')) {
                let asin = line.split(" [SEP] ").next().unwrap().to_string();
                if asin != goal_asin {
                    other = Some(asin);
                    break 'scan;
                }
            }
        }
        let other = other.expect("a non-goal search hit");

        env.step(&format!("click[{other}]")).unwrap();
        let last = env.step("click[buy now]").unwrap();
        assert!(last.done);
        assert_eq!(last.reward, 0.0);
    }

    #[test]
    fn unknown_action_grammar_is_rejected() {
        let mut env = seeded_env();
        env.reset().unwrap();
        let err = env.step("open the pod bay doors").unwrap_err();
        assert!(matches!(err, EvalError::EnvironmentRejected { .. }));
    }

    #[test]
    fn clicking_outside_results_is_rejected() {
        let mut env = seeded_env();
        env.reset().unwrap();
        let err = env.step("click[B00000001]").unwrap_err();
        assert!(matches!(err, EvalError::EnvironmentRejected { .. }));
    }

    #[test]
    fn back_to_search_always_returns_to_search_page() {
        let mut env = seeded_env();
        env.reset().unwrap();
        env.step("search[shirt]").unwrap();
        let outcome = env.step("click[back to search]").unwrap();
        assert!(outcome.observation.contains("Enter a query"));
        assert!(!outcome.done);
    }

    #[test]
    fn seeded_envs_generate_identical_goals() {
        let mut a = seeded_env();
        let mut b = seeded_env();
        assert_eq!(
            a.reset().unwrap().instruction,
            b.reset().unwrap().instruction
        );
    }
}

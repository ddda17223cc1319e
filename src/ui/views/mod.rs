mod help;
mod history;
mod members;
mod onboarding;
mod shopping_list;

pub use help::HelpView;
pub use history::HistoryView;
pub use members::MembersView;
pub use onboarding::{CreateFamilyForm, JoinFamilyForm};
pub use shopping_list::ShoppingListView;

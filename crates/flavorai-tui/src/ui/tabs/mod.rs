pub mod new_recipe;
pub mod recipes;

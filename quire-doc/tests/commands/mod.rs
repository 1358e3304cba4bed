mod priority;
mod script;

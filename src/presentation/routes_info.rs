// Machine-readable description of the HTTP routes served on / and /routes
use serde_json::{Value, json};

pub fn routes_document() -> Value {
    json!({
        "/, /routes": {
            "method": "GET",
            "parameters": [],
            "side_effects": "None",
            "returns": "Dictionary of routes as a JSON object",
            "errors": "None"
        },
        "/list_dashboards/": {
            "method": "GET",
            "parameters": [],
            "side_effects": "None",
            "returns": "JSON list of the dashboards published without a user (file names ending in .gd.json)",
            "errors": "500 if the dashboard store cannot be read"
        },
        "/add_user": {
            "method": "POST",
            "parameter_passing": "JSON body",
            "parameters": ["user"],
            "side_effects": "Adds the user to the database with the next user count",
            "returns": "User name and number as a JSON dictionary",
            "errors": "400 if the user is missing or already exists"
        },
        "/list_user_dashboards/:user": {
            "method": "GET",
            "parameters": ["user"],
            "side_effects": "None",
            "returns": "JSON list of all the dashboards published by the user",
            "errors": "400 for a blank or reserved user, 500 on a store failure"
        },
        "/add_dashboard": {
            "method": "POST",
            "parameter_passing": "JSON body",
            "parameters": ["user", "name", "dashboard", "studio_secret"],
            "side_effects": "Stores the dashboard in the body of the post under the user's folder and the given name, overwriting if the dashboard exists. Adds the user if the user isn't there",
            "returns": "The URL of the dashboard and the URL of the published view",
            "errors": "400 if name or dashboard is missing or studio_secret is not set to the correct value"
        },
        "/get_dashboard/:user/:name": {
            "method": "GET",
            "parameter_passing": "Path, or query string on /get_dashboard",
            "parameters": ["user", "name"],
            "side_effects": "None",
            "returns": "The dashboard as JSON",
            "errors": "400 if the dashboard doesn't exist"
        },
        "/get_dashboard_url/:user/:name": {
            "method": "GET",
            "parameter_passing": "Path, or query string on /get_dashboard_url",
            "parameters": ["user", "name"],
            "side_effects": "None",
            "returns": "The URL of the dashboard as {url}",
            "errors": "400 if the dashboard doesn't exist"
        },
        "/delete_dashboard": {
            "method": "POST",
            "parameter_passing": "JSON body",
            "parameters": ["user", "name"],
            "side_effects": "Deletes the dashboard from the user's folder",
            "returns": "The name of the deleted dashboard",
            "errors": "400 if the dashboard doesn't exist"
        },
        "/get_studio_url": {
            "method": "GET",
            "parameter_passing": "Query string",
            "parameters": ["hub", "language"],
            "side_effects": "None",
            "returns": "The URL of the studio build for the hub and language as {url}",
            "errors": "None"
        }
    })
}

use gramophone::logger::{self, Severity};
use gramophone::{Client, ClientConfig, Endpoint};

const FIXED_PARAMS: [(&str, &str); 9] = [
    ("GATEWAY_INTERFACE", "FastCGI/1.0"),
    ("SERVER_SOFTWARE", "automation"),
    ("REMOTE_ADDR", "10.17.1.100"),
    ("REMOTE_PORT", "9501"),
    ("SERVER_ADDR", "10.17.1.101"),
    ("SERVER_PORT", "80"),
    ("SERVER_NAME", "httpd"),
    ("SERVER_PROTOCOL", "HTTP/1.1"),
    ("CONTENT_TYPE", "application/xml; charset=utf-8"),
];

fn main() {
    logger::install(Severity::Info).unwrap();

    let body = "<html> Hello </html>";
    let content_length = body.len().to_string();

    let mut params = FIXED_PARAMS.to_vec();
    params.push(("REQUEST_METHOD", "GET"));
    params.push(("REQUEST_URI", "/login"));
    params.push(("CONTENT_LENGTH", content_length.as_str()));

    let endpoint = Endpoint::resolve("127.0.0.1:9000").unwrap();
    let client = Client::new(ClientConfig::new(endpoint)).unwrap();

    if client.open_connection() {
        let response = client.send_request(&params, body);
        println!("response received => {}", response.content_lossy());
        client.close_connection();
    }
}
